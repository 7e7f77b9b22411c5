//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, SyncollArgs};
use crate::error::Result;
use crate::import::{CoOccUpdateReport, ImportReport};
use crate::query::FreqDistrib;

/// Summary of a validated configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub source: Option<String>,
    pub db_path: String,
    pub corpora: Vec<String>,
    pub persistence: String,
    pub fetch_partitions: usize,
}

/// Version information.
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn render_human(&self) -> String;
}

impl HumanOutput for ImportReport {
    fn render_human(&self) -> String {
        format!(
            "Corpus:           {}\n\
             Vertical file:    {}\n\
             Tokens:           {}\n\
             Skipped rows:     {}\n\
             Edges:            {}\n\
             Parent sums:      {}\n\
             Child sums:       {}\n\
             Co-occ. pairs:    {}\n\
             Aggregation:      {:.2} s\n\
             Write:            {:.2} s\n\
             Finished:         {}",
            self.corpus_id,
            self.vertical_path.display(),
            self.tokens,
            self.skipped_rows,
            self.edges,
            self.parent_sums,
            self.child_sums,
            self.co_occurrence_pairs,
            self.aggregation_secs,
            self.write_secs,
            self.finished_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

impl HumanOutput for CoOccUpdateReport {
    fn render_human(&self) -> String {
        format!(
            "Corpus:           {}\n\
             Vertical file:    {}\n\
             Updated rows:     {}\n\
             Co-occ. pairs:    {}\n\
             Duration:         {:.2} s\n\
             Finished:         {}",
            self.corpus_id,
            self.vertical_path.display(),
            self.updated_rows,
            self.co_occurrence_pairs,
            self.duration_secs,
            self.finished_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

impl HumanOutput for FreqDistrib {
    fn render_human(&self) -> String {
        let mut out = format!("Corpus size: {}\n", self.corpus_size);
        if self.freqs.is_empty() {
            out.push_str("No candidates found.\n");
        } else {
            out.push_str(&format!(
                "{:<4} {:<30} {:>10} {:>12} {:>10}\n",
                "#", "word", "freq", "ipm", "logDice"
            ));
            for (i, item) in self.freqs.iter().enumerate() {
                out.push_str(&format!(
                    "{:<4} {:<30} {:>10} {:>12.3} {:>10.3}\n",
                    i + 1,
                    item.word,
                    item.freq,
                    item.ipm,
                    item.coll_weight
                ));
            }
        }
        out.push_str(&format!("Example query: {}", self.examples_query_tpl));
        out
    }
}

impl HumanOutput for ConfigSummary {
    fn render_human(&self) -> String {
        format!(
            "Config:           {}\n\
             Database:         {}\n\
             Corpora:          {}\n\
             Persistence:      {}\n\
             Fetch partitions: {}",
            self.source.as_deref().unwrap_or("-"),
            self.db_path,
            self.corpora.join(", "),
            self.persistence,
            self.fetch_partitions,
        )
    }
}

impl HumanOutput for VersionInfo {
    fn render_human(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

/// Render a result in the selected format.
pub fn format_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &SyncollArgs,
) -> Result<String> {
    match args.output_format {
        OutputFormat::Human => {
            let mut out = String::new();
            if args.verbosity() > 1 {
                out.push_str(message);
                out.push_str("\n\n");
            }
            out.push_str(&result.render_human());
            Ok(out)
        }
        OutputFormat::Json => {
            let json = if args.pretty {
                serde_json::to_string_pretty(result)?
            } else {
                serde_json::to_string(result)?
            };
            Ok(json)
        }
    }
}

/// Output a result in the selected format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &SyncollArgs,
) -> Result<()> {
    println!("{}", format_result(message, result, args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FreqDistribItem;
    use clap::Parser;

    fn distrib() -> FreqDistrib {
        FreqDistrib {
            freqs: vec![FreqDistribItem {
                word: "leader".to_string(),
                freq: 3,
                ipm: 0.5,
                coll_weight: 13.25,
                co_occ_score: Some(1.0),
            }],
            corpus_size: 6_000_000,
            examples_query_tpl: "[lemma=\"team\"]".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_human_output() {
        let args = SyncollArgs::try_parse_from(["syncoll", "version"]).unwrap();
        let out = format_result("Candidates", &distrib(), &args).unwrap();
        assert!(out.starts_with("Corpus size: 6000000"));
        assert!(out.contains("leader"));
        assert!(out.contains("13.250"));
        assert!(!out.contains("Candidates"));
    }

    #[test]
    fn test_json_output() {
        let args = SyncollArgs::try_parse_from(["syncoll", "--format", "json", "version"]).unwrap();
        let out = format_result("Candidates", &distrib(), &args).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["freqs"][0]["coOccScore"], 1.0);
        assert!(!out.contains('\n'));
    }
}
