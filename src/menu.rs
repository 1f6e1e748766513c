use std::io::{self, Write};

use ksis_export::config::Settings;
use ksis_export::export::Exporter;
use ksis_export::model::CompetitionId;
use ksis_export::normalize::Disambiguator;
use ksis_export::source::{ListingFilter, ResultsSource};
use ksis_export::{ExportError, Result};

use crate::{finish, print_listing};

const TIP: &str = "Tip: copy an id and use option 4 to export results.";

/// Interactive loop: list, search, export. Export failures are reported and
/// the menu continues; input errors end it.
pub fn run<S: ResultsSource, D: Disambiguator>(
    source: &S,
    exporter: &mut Exporter<'_, S, D>,
    settings: &Settings,
) -> Result<()> {
    loop {
        println!();
        println!("KSIS Competition Results Tool");
        println!("1. List all competitions");
        println!("2. List live competitions only");
        println!("3. Search competitions by keyword");
        println!("4. Export results by id");
        println!("5. Exit");

        let Some(choice) = read_input("Enter your choice (1-5): ")? else {
            return Ok(());
        };

        let outcome = match choice.as_str() {
            "1" => list(source, &ListingFilter::default()),
            "2" => list(source, &ListingFilter::live()),
            "3" => match read_input("Enter search keyword: ")? {
                Some(keyword) if !keyword.is_empty() => list(source, &ListingFilter::search(keyword)),
                _ => {
                    println!("No keyword provided.");
                    Ok(())
                }
            },
            "4" => match read_competition_ids()? {
                Some(ids) => exporter
                    .export_ids(&ids)
                    .and_then(|outcome| finish(&outcome, settings)),
                None => return Ok(()),
            },
            "5" => {
                println!("Goodbye!");
                return Ok(());
            }
            _ => {
                println!("Invalid choice. Please enter 1-5.");
                Ok(())
            }
        };

        if let Err(error) = outcome {
            eprintln!("error: {error}");
        }
    }
}

fn list<S: ResultsSource>(source: &S, filter: &ListingFilter) -> Result<()> {
    let competitions = filter.apply(source.list_competitions()?);
    print_listing(&competitions, filter);
    if !competitions.is_empty() {
        println!("\n{TIP}");
    }
    Ok(())
}

/// Asks until every entry parses. Several ids may be separated by spaces or commas.
fn read_competition_ids() -> Result<Option<Vec<CompetitionId>>> {
    loop {
        let Some(line) = read_input("Enter competition id(s) (ex: 8819): ")? else {
            return Ok(None);
        };
        if line.is_empty() {
            println!("The id cannot be empty.");
            continue;
        }
        let parsed: std::result::Result<Vec<CompetitionId>, ExportError> = line
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect();
        match parsed {
            Ok(ids) => return Ok(Some(ids)),
            Err(error) => println!("{error}"),
        }
    }
}

/// Returns `None` at end of input.
fn read_input(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
