//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Local, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;
use uuid::Uuid;

use crate::cli::short_id;
use crate::totp::{TotpCode, Urgency};
use crate::vault::{FileRecord, NoteEntry, PasswordEntry, TotpEntry};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Local-time rendering used in every listing.
pub fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// A TOTP code colored by how soon it expires.
pub fn styled_code(code: &TotpCode) -> String {
    let text = format!("{} ({}s)", code.code, code.remaining);
    match code.urgency() {
        Urgency::Fresh => style(text).green().to_string(),
        Urgency::Aging => style(text).yellow().to_string(),
        Urgency::Expiring => style(text).red().to_string(),
    }
}

/// Print a table of passwords (Id, Name, Username, Url, Category, Updated).
pub fn print_passwords_table(entries: &[(Uuid, &PasswordEntry)]) {
    if entries.is_empty() {
        info("No passwords found.");
        tip("Run `vaultkeep password add <NAME>` to add one.");
        return;
    }

    let mut table = new_table(vec!["Id", "Name", "Username", "URL", "Category", "Updated"]);
    for (id, e) in entries {
        table.add_row(vec![
            short_id(id),
            e.name.clone(),
            e.username.clone(),
            e.url.clone(),
            e.category.clone(),
            timestamp(&e.modified),
        ]);
    }
    println!("{table}");
}

/// Print a table of 2FA entries with their live codes.
pub fn print_totp_table(entries: &[(Uuid, &TotpEntry)]) {
    if entries.is_empty() {
        info("No 2FA entries found.");
        tip("Run `vaultkeep totp add <otpauth://...>` to add one.");
        return;
    }

    let mut table = new_table(vec!["Id", "Name", "Issuer", "Account", "Code", "Category"]);
    for (id, e) in entries {
        let code = match e.code() {
            Ok(code) => styled_code(&code),
            Err(_) => style("invalid secret").red().to_string(),
        };
        table.add_row(vec![
            short_id(id),
            e.name.clone(),
            e.issuer.clone(),
            e.account.clone(),
            code,
            e.category.clone(),
        ]);
    }
    println!("{table}");
}

/// Print a table of notes with a short preview.
pub fn print_notes_table(entries: &[(Uuid, &NoteEntry)]) {
    if entries.is_empty() {
        info("No notes found.");
        tip("Run `vaultkeep note add <TITLE>` to add one.");
        return;
    }

    let mut table = new_table(vec!["Id", "Title", "Preview", "Category", "Updated"]);
    for (id, e) in entries {
        table.add_row(vec![
            short_id(id),
            e.title.clone(),
            e.preview(),
            e.category.clone(),
            timestamp(&e.modified),
        ]);
    }
    println!("{table}");
}

/// Print a table of locker files.
pub fn print_files_table(entries: &[(Uuid, &FileRecord)]) {
    if entries.is_empty() {
        info("No files in the locker.");
        tip("Run `vaultkeep file put <PATH>` to encrypt one.");
        return;
    }

    let mut table = new_table(vec!["Id", "Name", "Size", "Category", "Added"]);
    for (id, e) in entries {
        table.add_row(vec![
            short_id(id),
            e.name.clone(),
            human_size(e.size),
            e.category.clone(),
            timestamp(&e.created),
        ]);
    }
    println!("{table}");
}

/// Print label/value rows (used by `show` commands).
pub fn print_fields(rows: &[(&str, String)]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (label, value) in rows {
        table.add_row(vec![style(label).bold().to_string(), value.clone()]);
    }
    println!("{table}");
}

/// Print a generic table from a header and string rows.
pub fn print_table(header: Vec<&str>, rows: Vec<Vec<String>>) {
    let mut table = new_table(header);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

/// Format a byte count as B / KiB / MiB / GiB.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
