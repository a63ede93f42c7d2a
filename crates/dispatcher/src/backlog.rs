use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use fifo_core::{FifoError, FifoResult, WorkItem};
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

const ID_COLUMN: &str = "id";
const PROGRESS_INTERVAL: usize = 1000;

/// 一个周期要处理的全部工作项，加载后不可变
#[derive(Debug, Clone, Default)]
pub struct Backlog {
    items: Vec<WorkItem>,
}

impl Backlog {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items }
    }

    /// 从带表头的CSV文件加载，`limit` 限制最多加载的条数
    pub fn from_csv_path(path: impl AsRef<Path>, limit: Option<usize>) -> FifoResult<Self> {
        let path = path.as_ref();
        info!("从 {} 加载待处理数据...", path.display());

        let file = std::fs::File::open(path).map_err(|e| {
            FifoError::BacklogLoad(format!("无法打开文件 {}: {e}", path.display()))
        })?;
        let backlog = Self::from_csv_reader(file, limit)?;

        info!("从CSV加载了 {} 条数据", backlog.len());
        Ok(backlog)
    }

    /// 解析CSV：`id` 列作为工作项标识，其余列原样放入数据字段
    pub fn from_csv_reader<R: Read>(reader: R, limit: Option<usize>) -> FifoResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| FifoError::BacklogLoad(format!("读取CSV表头失败: {e}")))?
            .clone();

        let id_index = headers
            .iter()
            .position(|header| header == ID_COLUMN)
            .ok_or_else(|| FifoError::BacklogLoad("CSV缺少id列".to_string()))?;

        let mut items = Vec::new();
        let mut seen = HashSet::new();

        for (row, record) in csv_reader.records().enumerate() {
            if limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }

            let record = record
                .map_err(|e| FifoError::BacklogLoad(format!("第 {} 行解析失败: {e}", row + 2)))?;

            let id = record.get(id_index).unwrap_or_default().trim().to_string();
            if id.is_empty() {
                return Err(FifoError::BacklogLoad(format!("第 {} 行id为空", row + 2)));
            }
            if !seen.insert(id.clone()) {
                return Err(FifoError::BacklogLoad(format!("重复的id: {id}")));
            }

            let data: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .enumerate()
                .filter(|(index, _)| *index != id_index)
                .map(|(_, (header, cell))| (header.to_string(), parse_cell(cell)))
                .collect();

            items.push(WorkItem::new(id, data));

            if items.len() % PROGRESS_INTERVAL == 0 {
                debug!("已加载 {} 条数据...", items.len());
            }
        }

        Ok(Self { items })
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<WorkItem> for Backlog {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// 整数优先，其次浮点数，否则保留为字符串
fn parse_cell(raw: &str) -> Value {
    if let Ok(integer) = raw.parse::<i64>() {
        return Value::Number(integer.into());
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(parse_cell("42"), json!(42));
        assert_eq!(parse_cell("-7"), json!(-7));
        assert_eq!(parse_cell("1700000000.5"), json!(1700000000.5));
        assert_eq!(parse_cell("high"), json!("high"));
        assert_eq!(parse_cell(""), json!(""));
        assert_eq!(parse_cell("NaN"), json!("NaN"));
    }
}
