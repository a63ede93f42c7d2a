use std::sync::{PoisonError, RwLock};

use fifo_core::{FifoError, FifoResult, Verbosity};
use tracing::{info, warn};

/// 级别变更时调用的回调，通常用于重载日志过滤器
pub type VerbosityHook = Box<dyn Fn(Verbosity) -> Result<(), String> + Send + Sync>;

/// 运行期可调整的诊断输出级别
pub struct VerbosityControl {
    level: RwLock<Verbosity>,
    hook: Option<VerbosityHook>,
}

impl VerbosityControl {
    pub fn new(level: Verbosity) -> Self {
        Self {
            level: RwLock::new(level),
            hook: None,
        }
    }

    /// 安装回调并立即应用当前级别
    pub fn with_hook(mut self, hook: VerbosityHook) -> Self {
        if let Err(e) = hook(self.get()) {
            warn!("应用初始日志级别失败: {}", e);
        }
        self.hook = Some(hook);
        self
    }

    /// 安装回调但保留当前生效的日志过滤器，直到下一次 [`set`](Self::set)
    pub fn with_deferred_hook(mut self, hook: VerbosityHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn get(&self) -> Verbosity {
        *self.level.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// 回调失败时保留原级别并返回错误
    pub fn set(&self, level: Verbosity) -> FifoResult<()> {
        let mut current = self.level.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(hook) = &self.hook {
            hook(level).map_err(|e| {
                warn!("切换日志级别到 {} 失败: {}", level, e);
                FifoError::Internal(format!("切换日志级别到 {level} 失败: {e}"))
            })?;
        }

        *current = level;
        info!("日志级别已设置为 {}", level);
        Ok(())
    }
}

impl std::fmt::Debug for VerbosityControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerbosityControl")
            .field("level", &self.get())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_set_invokes_hook() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&applied);
        let control = VerbosityControl::new(Verbosity::Info).with_hook(Box::new(move |level| {
            sink.lock().unwrap().push(level);
            Ok(())
        }));

        control.set(Verbosity::Verbose).unwrap();
        control.set(Verbosity::MetricsOnly).unwrap();

        assert_eq!(control.get(), Verbosity::MetricsOnly);
        assert_eq!(
            *applied.lock().unwrap(),
            vec![Verbosity::Info, Verbosity::Verbose, Verbosity::MetricsOnly]
        );
    }

    #[test]
    fn test_hook_failure_keeps_previous_level() {
        let control =
            VerbosityControl::new(Verbosity::Info).with_hook(Box::new(|_| Err("reload".into())));

        let result = control.set(Verbosity::Verbose);
        assert!(matches!(result, Err(FifoError::Internal(_))));
        assert_eq!(control.get(), Verbosity::Info);
    }

    #[test]
    fn test_deferred_hook_waits_for_first_change() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&applied);
        let control = VerbosityControl::new(Verbosity::Info).with_deferred_hook(Box::new(
            move |level| {
                sink.lock().unwrap().push(level);
                Ok(())
            },
        ));
        assert!(applied.lock().unwrap().is_empty());

        control.set(Verbosity::MetricsOnly).unwrap();
        assert_eq!(*applied.lock().unwrap(), vec![Verbosity::MetricsOnly]);
    }
}
