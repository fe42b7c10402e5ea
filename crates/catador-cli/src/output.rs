//! Terminal output helpers.

use catador::cli::Record;
use console::style;

/// Print a success line
pub fn success(message: &str) {
    println!("{} {message}", style("ok").green().bold());
}

/// Print a warning line
pub fn warning(message: &str) {
    eprintln!("{} {message}", style("warn").yellow().bold());
}

/// Render records as an aligned text table, header first
#[must_use]
pub fn render_records(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return "no records".to_string();
    };
    let columns = first.columns();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for record in records {
        for (i, value) in record.values().iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(value.len());
            }
        }
    }

    let mut out = String::new();
    for (i, column) in columns.iter().enumerate() {
        out.push_str(&format!("{column:<width$}  ", width = widths[i]));
    }
    out.push('\n');
    for record in records {
        for (i, value) in record.values().iter().enumerate() {
            out.push_str(&format!("{value:<width$}  ", width = widths[i]));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use catador::cli::parse_table;

    #[test]
    fn renders_aligned_columns() {
        let records = parse_table("id,name\n3,acme-release\n41,k\n").unwrap();
        let rendered = render_records(&records);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id  name"));
        assert!(lines[1].starts_with("3   acme-release"));
    }

    #[test]
    fn empty_record_set_says_so() {
        assert_eq!(render_records(&[]), "no records");
    }
}
