//! Import a plain-text corpus into the `book` table.
//!
//! Usage: cargo run --bin import_book <database> <book.txt>
//!
//! Each non-empty line is `<chapter> <verse> <text>`, e.g. `gen 1:1 In the beginning...`.
//! Chapters are stored lower-case without dots, the way lookups expect them.

use std::path::Path;

use jbot::responder::Database;
use jbot::responder::database::BookLine;

/// Parse one corpus line. `None` for blank or malformed lines.
fn parse_line(line: &str) -> Option<BookLine> {
    let (chapter, rest) = line.trim().split_once(char::is_whitespace)?;
    let (verse, text) = rest.trim_start().split_once(char::is_whitespace)?;
    let chapter = chapter.to_lowercase().replace('.', "");
    let verse = verse.to_string();
    let text = text.trim().to_string();
    if chapter.is_empty() || verse.is_empty() || text.is_empty() {
        return None;
    }
    Some(BookLine { chapter, verse, text })
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <database> <book.txt>", args[0]);
        std::process::exit(1);
    }

    let db_path = &args[1];
    let book_path = Path::new(&args[2]);

    let content = match std::fs::read_to_string(book_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read {}: {e}", book_path.display());
            std::process::exit(1);
        }
    };

    let db = match Database::open(db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database {db_path}: {e}");
            std::process::exit(1);
        }
    };

    let mut imported = 0;
    let mut skipped = 0;
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let Some(book_line) = parse_line(line) else {
            skipped += 1;
            continue;
        };
        if let Err(e) = db.insert_book_line(&book_line) {
            eprintln!("Failed to insert {} {}: {e}", book_line.chapter, book_line.verse);
            std::process::exit(1);
        }
        imported += 1;
    }

    println!("Imported {imported} lines into {db_path} ({skipped} malformed lines skipped)");
    match db.book_line_count() {
        Ok(total) => println!("The book now holds {total} lines"),
        Err(e) => eprintln!("Failed to count lines: {e}"),
    }
}
