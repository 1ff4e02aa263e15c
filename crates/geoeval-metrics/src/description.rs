//! Extract `location, country, continent` from free-text descriptions
//!
//! Ground-truth descriptions end with a sentence of the form
//! `the image was most likely taken in <location>, <country>[, <continent>].`
//! When the continent is omitted it is looked up from the country.

use crate::classification::LocationTriple;
use crate::MetricsError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const MARKER: &str = "the image was most likely taken in ";

/// Continent written when the country is not in the table
pub const UNKNOWN_CONTINENT: &str = "Unknown";

/// Country names (English and Chinese) and their continent
const CONTINENTS: &[(&str, &str, &str)] = &[
    ("France", "法国", "Europe"),
    ("Russia", "俄罗斯", "Europe"),
    ("Uganda", "乌干达", "Africa"),
    ("United States", "美国", "North America"),
    ("Australia", "澳大利亚", "Australia"),
    ("Japan", "日本", "Asia"),
    ("Canada", "加拿大", "North America"),
    ("Brazil", "巴西", "South America"),
    ("South Korea", "韩国", "Asia"),
    ("Peru", "秘鲁", "South America"),
    ("United Kingdom", "英国", "Europe"),
    ("South Africa", "南非", "Africa"),
    ("Thailand", "泰国", "Asia"),
    ("Finland", "芬兰", "Europe"),
    ("Kenya", "肯尼亚", "Africa"),
    ("Italy", "意大利", "Europe"),
    ("New Zealand", "新西兰", "Australia"),
    ("Mexico", "墨西哥", "North America"),
    ("India", "印度", "Asia"),
    ("Germany", "德国", "Europe"),
];

/// Continent of `country`, matched on either its English or Chinese name
pub fn continent_for(country: &str) -> Option<&'static str> {
    CONTINENTS
        .iter()
        .find(|(english, chinese, _)| english.eq_ignore_ascii_case(country) || *chinese == country)
        .map(|(_, _, continent)| *continent)
}

/// Parse the closing location sentence of a description
///
/// The phrase is matched case-insensitively and everything after it up to
/// the final period (one trailing newline allowed) is the answer. Location
/// and country may not contain commas; the continent may not contain periods.
pub fn parse_description(description: &str) -> Option<LocationTriple> {
    let text = description.strip_suffix('\n').unwrap_or(description);
    let body = text.strip_suffix('.')?;
    let lowered = body.to_ascii_lowercase();

    lowered
        .match_indices(MARKER)
        .find_map(|(start, _)| parse_tail(&body[start + MARKER.len()..]))
}

fn parse_tail(tail: &str) -> Option<LocationTriple> {
    let (location, rest) = tail.split_once(',')?;
    let rest = rest.strip_prefix(' ')?;
    if location.is_empty() {
        return None;
    }

    let (country, continent) = match rest.split_once(',') {
        Some((country, continent)) => {
            let continent = continent.strip_prefix(' ')?;
            if continent.is_empty() || continent.contains('.') {
                return None;
            }
            (country, continent.to_string())
        }
        None => (
            rest,
            continent_for(rest).unwrap_or(UNKNOWN_CONTINENT).to_string(),
        ),
    };
    if country.is_empty() {
        return None;
    }

    Some(LocationTriple::new(location, country, continent))
}

/// Summary of converting a description table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescribeReport {
    /// Files written
    pub written: usize,
    /// Rows whose description had no location sentence
    pub unmatched: usize,
}

/// Read a CSV with `panoID` and `description` columns and write
/// `<panoID>.txt` files holding `location, country, continent`
pub fn describe_csv(input: &Path, output_dir: &Path) -> Result<DescribeReport, MetricsError> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| MetricsError::InvalidFormat(format!("missing required column: {}", name)))
    };
    let id_index = column("panoID")?;
    let description_index = column("description")?;

    fs::create_dir_all(output_dir)?;
    let mut report = DescribeReport::default();

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!("Row {}: {}, skipping", row, e);
                report.unmatched += 1;
                continue;
            }
        };
        let (Some(id), Some(description)) = (record.get(id_index), record.get(description_index)) else {
            warn!("Row {}: missing fields, skipping", row);
            report.unmatched += 1;
            continue;
        };

        match parse_description(description) {
            Some(triple) => {
                debug!("{}: {}", id, triple);
                fs::write(output_dir.join(format!("{}.txt", id)), triple.to_string())?;
                report.written += 1;
            }
            None => {
                warn!("Row {}: description does not match the expected format, skipping", row);
                report.unmatched += 1;
            }
        }
    }

    info!("Wrote {} location files to {}", report.written, output_dir.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_part_sentence() {
        let triple = parse_description(
            "Red soil and tin roofs. The image was most likely taken in Kampala, Uganda, Africa.",
        )
        .unwrap();
        assert_eq!(triple, LocationTriple::new("Kampala", "Uganda", "Africa"));
    }

    #[test]
    fn test_continent_from_table() {
        let triple = parse_description("the image was most likely taken in Turku, Finland.").unwrap();
        assert_eq!(triple.continent, "Europe");

        let triple = parse_description("THE IMAGE WAS MOST LIKELY TAKEN IN 东京, 日本.\n").unwrap();
        assert_eq!(triple, LocationTriple::new("东京", "日本", "Asia"));
    }

    #[test]
    fn test_unknown_country() {
        let triple = parse_description("The image was most likely taken in Quito, Ecuador.").unwrap();
        assert_eq!(triple.continent, UNKNOWN_CONTINENT);
    }

    #[test]
    fn test_continent_may_contain_commas() {
        let triple =
            parse_description("The image was most likely taken in Nome, Alaska, United States, North America.")
                .unwrap();
        assert_eq!(triple.country, "Alaska");
        assert_eq!(triple.continent, "United States, North America");
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(parse_description("The image was most likely taken in Lima, Peru").is_none());
        assert!(parse_description("The image was most likely taken in Lima.").is_none());
        assert!(parse_description("No location given.").is_none());
    }

    #[test]
    fn test_continent_lookup() {
        assert_eq!(continent_for("germany"), Some("Europe"));
        assert_eq!(continent_for("新西兰"), Some("Australia"));
        assert_eq!(continent_for("Atlantis"), None);
    }

    #[test]
    fn test_describe_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("GT.csv");
        let output = dir.path().join("ground_truth");
        fs::write(
            &input,
            "panoID,description\n\
             p1,\"Snow, pines. The image was most likely taken in Rovaniemi, Finland.\"\n\
             p2,No idea where this is.\n",
        )
        .unwrap();

        let report = describe_csv(&input, &output).unwrap();
        assert_eq!(report, DescribeReport { written: 1, unmatched: 1 });
        assert_eq!(
            fs::read_to_string(output.join("p1.txt")).unwrap(),
            "Rovaniemi, Finland, Europe"
        );
    }

    #[test]
    fn test_describe_csv_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("GT.csv");
        fs::write(&input, "id,text\n1,x\n").unwrap();
        let result = describe_csv(&input, dir.path());
        assert!(matches!(result, Err(MetricsError::InvalidFormat(_))));
    }
}
