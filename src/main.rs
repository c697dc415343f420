use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use govint_lib::cli::Args;
use govint_lib::dictionary::WordList;
use govint_lib::extraction::{extract, ExtractionResult};
use govint_lib::reference::loader::{ensure_zipcode_table, load_reference_tables};

const RESULT_COLUMNS: &str = "award_id\tpublic_law_statement\tawarding_agency_acronyms\tpotential_year";

struct InputRow {
    line: String,
    statement: String,
    grant_year: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let _ = dotenv::dotenv();
    let args = Args::parse();

    let run_id = Uuid::new_v4();
    info!("Starting award extraction run {}", run_id);
    let run_start = Instant::now();

    let inputs = args.input_files();
    if inputs.is_empty() {
        bail!("No input file given; pass --input or --input_list");
    }
    let output = args
        .output
        .clone()
        .context("No output file given; pass --output")?;
    if args.n_output == 0 {
        bail!("--n_output must be at least 1");
    }

    let mut header = String::new();
    let mut rows: Vec<InputRow> = Vec::new();
    for input in &inputs {
        read_input_file(input, &mut header, &mut rows)
            .with_context(|| format!("Failed to read input {}", input.display()))?;
    }
    info!("Loaded {} statements from {} file(s)", rows.len(), inputs.len());

    // The zip table is corpus-filtered, so it can only be bootstrapped once
    // the statements are in hand.
    let statements: Vec<String> = rows.iter().map(|row| row.statement.clone()).collect();
    ensure_zipcode_table(&args.data_dir, &statements)
        .await
        .context("Failed to bootstrap the zip code table")?;

    let tables = Arc::new(
        load_reference_tables(&args.data_dir).context("Failed to load reference tables")?,
    );
    let dictionary = Arc::new(
        WordList::load(&args.data_dir.join("words.txt"))
            .context("Failed to load the English word list")?,
    );
    info!("Word list loaded ({} entries)", dictionary.len());

    let progress = ProgressBar::new(rows.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("  [{elapsed_precise}] {bar:30.green/blue} {pos}/{len} Extracting award ids...")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    let workers = num_cpus::get().saturating_sub(1).max(1);
    let chunk_size = ((rows.len() + workers - 1) / workers).max(1);
    let mut handles = Vec::new();
    for chunk in chunks_of(rows, chunk_size) {
        let tables = Arc::clone(&tables);
        let dictionary = Arc::clone(&dictionary);
        let progress = progress.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            chunk
                .into_iter()
                .map(|row| {
                    let result = extract(&row.statement, &tables, &*dictionary, row.grant_year);
                    progress.inc(1);
                    (row.line, result)
                })
                .collect::<Vec<(String, ExtractionResult)>>()
        }));
    }

    let mut results: Vec<(String, ExtractionResult)> = Vec::new();
    for handle in join_all(handles).await {
        results.extend(handle.context("Extraction worker panicked")?);
    }
    progress.finish_with_message("Extraction complete");

    write_outputs(&output, args.n_output, &header, &results)?;

    info!(
        "Run {} finished: {} statements in {:.1?}",
        run_id,
        results.len(),
        run_start.elapsed()
    );
    Ok(())
}

fn read_input_file(path: &PathBuf, header: &mut String, rows: &mut Vec<InputRow>) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();
    let file_header = lines.next().context("Input file is empty")?;
    let columns: Vec<&str> = file_header.split('\t').collect();
    let statement_col = columns
        .iter()
        .position(|c| *c == "gi_statement")
        .context("Input file has no gi_statement column")?;
    let year_col = columns.iter().position(|c| *c == "grant_year");

    if header.is_empty() {
        *header = file_header.to_string();
    } else if *header != file_header {
        bail!("Input files have mismatched headers");
    }

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let statement = fields.get(statement_col).copied().unwrap_or("").to_string();
        let grant_year = year_col
            .and_then(|idx| fields.get(idx))
            .and_then(|v| v.trim().parse::<i32>().ok());
        rows.push(InputRow {
            line: line.to_string(),
            statement,
            grant_year,
        });
    }
    Ok(())
}

fn chunks_of(rows: Vec<InputRow>, chunk_size: usize) -> Vec<Vec<InputRow>> {
    let mut chunks = Vec::new();
    let mut current = Vec::with_capacity(chunk_size);
    for row in rows {
        current.push(row);
        if current.len() == chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn write_outputs(
    output: &PathBuf,
    n_output: usize,
    header: &str,
    results: &[(String, ExtractionResult)],
) -> Result<()> {
    let paths = output_paths(output, n_output);
    let per_file = ((results.len() + n_output - 1) / n_output).max(1);
    for (idx, path) in paths.iter().enumerate() {
        let slice_start = (idx * per_file).min(results.len());
        let slice_end = ((idx + 1) * per_file).min(results.len());
        let mut out = format!("{}\t{}\n", header, RESULT_COLUMNS);
        for (line, result) in &results[slice_start..slice_end] {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                line,
                result.award_id,
                result.public_law_statement,
                result.awarding_agency_acronyms,
                result.potential_year
            ));
        }
        std::fs::write(path, out)
            .with_context(|| format!("Failed to write output {}", path.display()))?;
        info!(
            "Wrote {} ({} rows)",
            path.display(),
            slice_end - slice_start
        );
    }
    Ok(())
}

fn output_paths(output: &PathBuf, n_output: usize) -> Vec<PathBuf> {
    if n_output == 1 {
        return vec![output.clone()];
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = output
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (0..n_output)
        .map(|i| output.with_file_name(format!("{}_{}{}", stem, i, extension)))
        .collect()
}
