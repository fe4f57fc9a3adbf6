//! Writers for projected records.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tally_import::ImportableTransaction;

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => {
            let file = File::create(p).with_context(|| format!("create {}", p.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    })
}

pub fn write_csv<W: Write>(out: W, records: &[ImportableTransaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for record in records {
        wtr.serialize(record).context("write csv row")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

pub fn write_json<W: Write>(mut out: W, records: &[ImportableTransaction]) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, records).context("write json")?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_ingest::{StatementFormat, StatementParser};

    fn records() -> Vec<ImportableTransaction> {
        let parser = StatementParser::new(&StatementFormat::builtin()).unwrap();
        let outcome = parser
            .parse_text(
                "Statement date 30 Sep 2025 Closing balance $508.02 Your transactions \
                 12 Sep 2025 Direct Debit Nissan Financial -508.02 \
                 14 Sep 2025 Payment Thank You 100.00",
            )
            .unwrap();
        tally_import::project(&outcome.statement, "visa")
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &records()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "accountId,date,description,amount,type,category,sourceCategory"
        );
        assert_eq!(
            lines[1],
            "visa,2025-09-12,Direct Debit Nissan Financial,-508.02,debit,Uncategorized,credit-card-statement"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_is_an_array() {
        let mut buf = Vec::new();
        write_json(&mut buf, &records()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["type"], "credit");
    }
}
