//! Chromosomes command - list primary chromosomes of an assembly

use anyhow::Result;
use helix_core::{Chromosome, GenomeService};

use super::OutputOptions;
use crate::client::HttpGenomeService;
use crate::config::Config;
use crate::error::CliError;

pub async fn execute(config: &Config, out: OutputOptions, genome_id: &str) -> Result<()> {
    let service = HttpGenomeService::new(config)?;
    let spinner = out.spinner(format!("Fetching chromosomes for {}", genome_id));
    let result = service.list_chromosomes(genome_id).await;
    spinner.finish_and_clear();
    let chromosomes = result.map_err(CliError::from)?;
    log::info!("{} has {} primary chromosomes", genome_id, chromosomes.len());

    if out.json {
        return out.print_json(&chromosomes);
    }
    print!("{}", render(&chromosomes));
    Ok(())
}

fn render(chromosomes: &[Chromosome]) -> String {
    chromosomes
        .iter()
        .map(|c| format!("{:<8} {:>12} bp\n", c.name, c.size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let text = render(&[Chromosome::new("chr1", 248956422), Chromosome::new("chrM", 16569)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("chr1"));
        assert!(lines[1].ends_with("16569 bp"));
    }
}
