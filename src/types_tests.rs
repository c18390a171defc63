//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outcome_classification() {
        assert_eq!(classify_outcome("Win"), Outcome::Win);
        assert_eq!(classify_outcome("BIG WIN"), Outcome::Win);
        assert_eq!(classify_outcome("Loss"), Outcome::Lose);
        assert_eq!(classify_outcome("lose"), Outcome::Lose);
        assert_eq!(classify_outcome("Breakeven"), Outcome::Breakeven);
        assert_eq!(classify_outcome("BE"), Outcome::Breakeven);
        assert_eq!(classify_outcome("scratch"), Outcome::Unknown);
        assert_eq!(classify_outcome(""), Outcome::Unknown);
    }

    #[test]
    fn test_outcome_win_beats_breakeven_substring() {
        // "win before news" contains "be" but classifies as a win
        assert_eq!(classify_outcome("win before news"), Outcome::Win);
    }

    #[test]
    fn test_grade_round_trip() {
        for label in ["A+", "A", "B", "C", "D", "F"] {
            let grade: Grade = label.parse().unwrap();
            assert_eq!(grade.to_string(), label);
        }
        assert!("S".parse::<Grade>().is_err());
        assert!("a+".parse::<Grade>().is_err(), "labels are case-sensitive");
    }

    #[test]
    fn test_grade_serialization() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(serde_json::to_string(&Grade::F).unwrap(), "\"F\"");
        let grade: Grade = serde_json::from_str("\"A+\"").unwrap();
        assert_eq!(grade, Grade::APlus);
    }

    #[test]
    fn test_file_attachment_url_resolution() {
        let hosted = FileAttachment {
            file_url: Some("https://files/a.png".to_string()),
            external_url: Some("https://ext/b.png".to_string()),
        };
        assert_eq!(hosted.url(), Some("https://files/a.png"));

        let external = FileAttachment {
            file_url: None,
            external_url: Some("https://ext/b.png".to_string()),
        };
        assert_eq!(external.url(), Some("https://ext/b.png"));

        let empty = FileAttachment {
            file_url: Some(String::new()),
            external_url: None,
        };
        assert_eq!(empty.url(), None, "empty URLs do not resolve");
    }

    #[test]
    fn test_field_value_kind() {
        assert_eq!(FieldValue::Date("2024-01-01".into()).kind(), FieldKind::Date);
        assert_eq!(FieldValue::Number(dec!(1)).kind(), FieldKind::Number);
        assert_eq!(
            FieldValue::MultiSelect(vec![]).kind(),
            FieldKind::MultiSelect
        );
        assert_eq!(FieldValue::Title(vec![]).kind(), FieldKind::Title);
    }

    #[test]
    fn test_raw_record_deserialization() {
        let json = r#"{
            "id": "rec-1",
            "fields": [
                {"name": "Date", "kind": "date", "value": "2024-03-01"},
                {"name": "R Multiple", "kind": "number", "value": 2.5},
                {"name": "Tags", "kind": "multi_select", "value": ["Sweep"]},
                {"name": "Comment", "kind": "text", "value": ["clean entry"]},
                {"name": "Files", "kind": "files", "value": [{"file_url": "https://x/1.png"}]}
            ]
        }"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "rec-1");
        assert_eq!(record.fields.len(), 5);
        assert_eq!(record.fields[0].value.kind(), FieldKind::Date);
        assert_eq!(record.fields[1].value.kind(), FieldKind::Number);
    }

    #[test]
    fn test_trade_serialization_round_trip() {
        let mut trade = Trade::empty("t1");
        trade.date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1);
        trade.r_multiple = Some(dec!(1.5));
        trade.grade = Some(Grade::B);
        trade.outcome = Outcome::Win;

        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "t1");
        assert_eq!(back.date, trade.date);
        assert_eq!(back.r_multiple, Some(dec!(1.5)));
        assert_eq!(back.grade, Some(Grade::B));
        assert_eq!(back.outcome, Outcome::Win);
    }
}
