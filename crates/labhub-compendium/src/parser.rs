//! Caret-delimited compendium flat files.
//!
//! Both files start with an MSH header line that is skipped. Field layout:
//!
//! | file     | code | question | active | text | tips | field type | name | specimen | notes |
//! |----------|------|----------|--------|------|------|------------|------|----------|-------|
//! | ORDCODE  | 1    |          | 4      |      |      |            | 6    | 7        | 8     |
//! | AOE      | 3    | 4        | 6      | 9    | 11   | 13         |      |          |       |

use labhub_core::FieldType;

pub const DELIMITER: char = '^';
const ACTIVE: &str = "A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCodeRecord {
    pub procedure_code: String,
    pub name: String,
    pub specimen: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AoeRecord {
    pub procedure_code: String,
    pub question_code: String,
    pub text: String,
    pub tips: String,
    pub field_type: FieldType,
}

/// How a single data line was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine<T> {
    Record(T),
    Inactive,
    Invalid(&'static str),
}

/// Data lines with their 1-based line numbers: header and blank lines dropped,
/// trailing carriage returns removed.
pub fn data_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .split('\n')
        .enumerate()
        .skip(1)
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).map_or("", |f| f.trim())
}

pub fn parse_order_code(line: &str) -> ParsedLine<OrderCodeRecord> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    let procedure_code = field(&fields, 1);
    if procedure_code.is_empty() {
        return ParsedLine::Invalid("missing procedure code");
    }
    if fields.len() <= 4 {
        return ParsedLine::Invalid("missing activity flag");
    }
    if field(&fields, 4) != ACTIVE {
        return ParsedLine::Inactive;
    }
    ParsedLine::Record(OrderCodeRecord {
        procedure_code: procedure_code.to_string(),
        name: field(&fields, 6).to_string(),
        specimen: field(&fields, 7).to_string(),
        notes: field(&fields, 8).to_string(),
    })
}

pub fn parse_aoe(line: &str) -> ParsedLine<AoeRecord> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    let procedure_code = field(&fields, 3);
    let question_code = field(&fields, 4);
    if procedure_code.is_empty() {
        return ParsedLine::Invalid("missing procedure code");
    }
    if question_code.is_empty() {
        return ParsedLine::Invalid("missing question code");
    }
    if fields.len() <= 6 {
        return ParsedLine::Invalid("missing activity flag");
    }
    if field(&fields, 6) != ACTIVE {
        return ParsedLine::Inactive;
    }
    let type_code = match field(&fields, 13) {
        "" => "Q",
        code => code,
    };
    ParsedLine::Record(AoeRecord {
        procedure_code: procedure_code.to_string(),
        question_code: question_code.to_string(),
        text: field(&fields, 9).to_string(),
        tips: field(&fields, 11).to_string(),
        field_type: FieldType::from_code(type_code),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_order_code() {
        let parsed = parse_order_code("A^12345^STL^X^A^0^CBC^Serum^Note");
        assert_eq!(
            parsed,
            ParsedLine::Record(OrderCodeRecord {
                procedure_code: "12345".into(),
                name: "CBC".into(),
                specimen: "Serum".into(),
                notes: "Note".into(),
            })
        );
    }

    #[test]
    fn test_inactive_order_code() {
        assert_eq!(
            parse_order_code("A^12345^STL^X^I^0^CBC^Serum^Note"),
            ParsedLine::Inactive
        );
    }

    #[test]
    fn test_short_order_code_line() {
        assert_eq!(
            parse_order_code("A^12345^STL"),
            ParsedLine::Invalid("missing activity flag")
        );
        assert_eq!(
            parse_order_code("A^ ^STL^X^A"),
            ParsedLine::Invalid("missing procedure code")
        );
        // optional trailing fields may be absent
        match parse_order_code("A^777^STL^X^A ^0^Lipid") {
            ParsedLine::Record(r) => {
                assert_eq!(r.name, "Lipid");
                assert_eq!(r.specimen, "");
                assert_eq!(r.notes, "");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_aoe_record() {
        let line = "A^STL^X^12345^FAST^1^A^x^x^Fasting?^x^Hours since last meal^x^S";
        match parse_aoe(line) {
            ParsedLine::Record(r) => {
                assert_eq!(r.procedure_code, "12345");
                assert_eq!(r.question_code, "FAST");
                assert_eq!(r.text, "Fasting?");
                assert_eq!(r.tips, "Hours since last meal");
                assert_eq!(r.field_type, FieldType::Select);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_aoe_field_type_defaults_to_text() {
        match parse_aoe("A^STL^X^12345^VOL^1^A^x^x^Volume") {
            ParsedLine::Record(r) => assert_eq!(r.field_type, FieldType::Text),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_aoe_invalid_lines() {
        assert_eq!(
            parse_aoe("A^STL^X^12345^^1^A"),
            ParsedLine::Invalid("missing question code")
        );
        assert_eq!(parse_aoe("A^STL^X^12345^Q1^1^I"), ParsedLine::Inactive);
        assert_eq!(
            parse_aoe("A^STL^X^12345^Q1"),
            ParsedLine::Invalid("missing activity flag")
        );
    }

    #[test]
    fn test_data_lines_skip_header_and_blanks() {
        let contents = "MSH^header\r\nA^1^x^x^A\r\n\r\n   \nA^2^x^x^A";
        let lines: Vec<_> = data_lines(contents).collect();
        assert_eq!(lines, vec![(2, "A^1^x^x^A"), (5, "A^2^x^x^A")]);
    }
}
