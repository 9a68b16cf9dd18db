use tracing::trace;

use crate::error::ParseError;

pub const FIELD_COUNT: usize = 10;
const WORD_FIELD: usize = 1;
const POS_FIELD: usize = 3;
const GOV_FIELD: usize = 6;
const RELN_FIELD: usize = 7;

/// The columns of one CoNLL-X row that dependency conversion reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConllRow {
    /// 1-based line number in the source text.
    pub line: usize,
    pub word: String,
    pub tag: String,
    /// Governor index; `None` when the column is empty.
    pub governor: Option<u32>,
    pub relation: String,
}

fn parse_row(line_no: usize, line: &str) -> Result<ConllRow, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            line: line_no,
            found: fields.len(),
        });
    }
    let governor = match fields[GOV_FIELD] {
        "" => None,
        text => Some(text.parse::<u32>().map_err(|_| ParseError::InvalidField {
            line: line_no,
            field: "governor",
            value: text.to_string(),
        })?),
    };
    Ok(ConllRow {
        line: line_no,
        word: fields[WORD_FIELD].to_string(),
        tag: fields[POS_FIELD].to_string(),
        governor,
        relation: fields[RELN_FIELD].to_string(),
    })
}

/// Splits CoNLL-X text into sentences. Blank lines separate sentences;
/// runs of blank lines are ignored and a final sentence needs no trailing
/// blank line.
pub fn parse_conllx(text: &str) -> Result<Vec<Vec<ConllRow>>, ParseError> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(parse_row(i + 1, line)?);
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    trace!(sentences = sentences.len(), "parsed conll-x");
    Ok(sentences)
}

/// `i word _ tag tag _ gov reln _ _`
pub fn format_conllx_row(
    index: u32,
    word: &str,
    tag: &str,
    governor: u32,
    relation: &str,
) -> String {
    format!("{index}\t{word}\t_\t{tag}\t{tag}\t_\t{governor}\t{relation}\t_\t_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\tSam\t_\tNNP\tNNP\t_\t2\tnsubj\t_\t_\n\
                          2\tdied\t_\tVBD\tVBD\t_\t0\troot\t_\t_\n\
                          \n\n\
                          1\tHi\t_\tUH\tUH\t_\t\tnull\t_\t_\n";

    #[test]
    fn test_sentences_split_on_blank_lines() {
        let sentences = parse_conllx(SAMPLE).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0][1].word, "died");
        assert_eq!(sentences[0][1].governor, Some(0));
        assert_eq!(sentences[0][0].tag, "NNP");
        assert_eq!(sentences[1][0].governor, None);
        assert_eq!(sentences[1][0].line, 5);
    }

    #[test]
    fn test_field_count_checked() {
        assert_eq!(
            parse_conllx("1\tSam\tNNP\n"),
            Err(ParseError::FieldCount { line: 1, found: 3 })
        );
    }

    #[test]
    fn test_bad_governor() {
        let err = parse_conllx("1\tSam\t_\tNNP\tNNP\t_\tx\tnsubj\t_\t_").unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { field: "governor", .. }));
    }

    #[test]
    fn test_formatted_row_parses_back() {
        let row = format_conllx_row(3, "today", "NN", 2, "tmod");
        assert_eq!(row, "3\ttoday\t_\tNN\tNN\t_\t2\ttmod\t_\t_");
        let parsed = parse_conllx(&row).unwrap();
        assert_eq!(parsed[0][0].relation, "tmod");
    }
}
