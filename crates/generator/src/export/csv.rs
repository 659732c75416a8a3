//! CSV and URL-list rendering for completed batches.

use common::protocol::TokenRow;

use crate::serial::SerialRange;

const CSV_HEADER: &str = "product,serial,token,url";

/// Render rows as CSV with a `product,serial,token,url` header.
///
/// Every value is wrapped in double quotes with inner quotes doubled. Lines are
/// joined with `\n` and there is no trailing newline.
pub fn render_csv(rows: &[TokenRow]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + rows.len() * 128);
    out.push_str(CSV_HEADER);
    for row in rows {
        out.push('\n');
        let fields = [&row.product, &row.serial, &row.token, &row.url];
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_quoted(&mut out, field);
        }
    }
    out
}

/// Render the URL of every row, one per line.
pub fn render_url_list(rows: &[TokenRow]) -> String {
    rows.iter()
        .map(|r| r.url.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Download file name for a batch, e.g. `koas_urls_maron_0001-9999.csv`.
pub fn csv_file_name(prefix: &str, product: &str, range: &SerialRange) -> String {
    format!("{prefix}_{product}_{}-{}.csv", range.start(), range.end())
}

fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    out.push_str(&value.replace('"', "\"\""));
    out.push('"');
}
