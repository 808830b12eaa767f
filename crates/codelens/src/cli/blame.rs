//! Show the change records git attributes to a file.

use std::path::Path;

use codelens::{BlameSource, Error, SourceFile, StderrPolicy};
use colored::Colorize;

use super::display::print_change_records;

/// Run the blame command.
pub async fn run(path: &Path, config: Option<&Path>, strict: bool) -> Result<(), Error> {
    let file = SourceFile::new(path)?;
    let mut config = super::load_config(&file, config).await?;
    if strict {
        config.blame.stderr_policy = StderrPolicy::Strict;
    }

    let records = config.blame.git_blame().blame(file.path()).await?;

    println!(
        "{} {} {}",
        "Blame for".cyan().bold(),
        file.path().display().to_string().white().bold(),
        format!("({} lines)", records.len()).dimmed()
    );
    println!();
    print_change_records(&records);

    Ok(())
}
