#[cfg(test)]
mod tests {
    use std::io::Write;

    use fifo_core::FifoError;
    use fifo_dispatcher::Backlog;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv_with_payload_fields() {
        let file = csv_file(
            "timestamp,id,value,label\n1700000000,A,1.5,north\n1700000060,B,2,south\n",
        );

        let backlog = Backlog::from_csv_path(file.path(), None).unwrap();
        assert_eq!(backlog.len(), 2);

        let first = &backlog.items()[0];
        assert_eq!(first.id, "A");
        assert_eq!(first.retry_count, 0);
        assert_eq!(first.data["timestamp"], json!(1700000000));
        assert_eq!(first.data["value"], json!(1.5));
        assert_eq!(first.data["label"], json!("north"));
        assert!(!first.data.contains_key("id"));

        assert_eq!(backlog.items()[1].data["value"], json!(2));
    }

    #[test]
    fn test_limit_truncates_in_file_order() {
        let file = csv_file("id,value\nA,1\nB,2\nC,3\nD,4\n");

        let backlog = Backlog::from_csv_path(file.path(), Some(2)).unwrap();
        let ids: Vec<&str> = backlog.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_missing_id_column() {
        let result = Backlog::from_csv_reader("name,value\nA,1\n".as_bytes(), None);
        assert!(matches!(result, Err(FifoError::BacklogLoad(_))));
    }

    #[test]
    fn test_empty_and_duplicate_ids_are_rejected() {
        let result = Backlog::from_csv_reader("id,value\n,1\n".as_bytes(), None);
        assert!(matches!(result, Err(FifoError::BacklogLoad(_))));

        let result = Backlog::from_csv_reader("id,value\nA,1\nA,2\n".as_bytes(), None);
        assert!(matches!(result, Err(FifoError::BacklogLoad(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Backlog::from_csv_path("/nonexistent/points_data.csv", None);
        assert!(matches!(result, Err(FifoError::BacklogLoad(_))));
    }

    #[test]
    fn test_header_only_file_is_empty_backlog() {
        let backlog = Backlog::from_csv_reader("id,value\n".as_bytes(), None).unwrap();
        assert!(backlog.is_empty());
    }
}
