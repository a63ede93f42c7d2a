use fifo_core::ProcessRequest;

/// 决定一个请求是否模拟处理失败
pub trait FailureInjector: Send + Sync {
    fn should_fail(&self, request: &ProcessRequest) -> bool;
}

/// 按固定概率随机失败
#[derive(Debug, Clone, Copy)]
pub struct RandomFailure {
    probability: f64,
}

impl RandomFailure {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl FailureInjector for RandomFailure {
    fn should_fail(&self, _request: &ProcessRequest) -> bool {
        self.probability > 0.0 && rand::random::<f64>() < self.probability
    }
}

impl<F> FailureInjector for F
where
    F: Fn(&ProcessRequest) -> bool + Send + Sync,
{
    fn should_fail(&self, request: &ProcessRequest) -> bool {
        self(request)
    }
}
