//! Source loaders.
//!
//! Loaders only locate columns and copy cells; they never drop rows. Any
//! missing file or missing required column is fatal.

use sct_core::{Error, Result};
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::raw::{RawTable, delimiter_for, read_delimited};
use crate::records::{RawIdentifierRecord, RawOutcomesRecord, RawSearchRecord};

fn read_table(path: &Path, cfg: &PipelineConfig) -> Result<RawTable> {
    let delim = delimiter_for(path, cfg.inputs.delimiter);
    read_delimited(path, delim, &cfg.inputs.null_tokens)
}

/// Files in `dir` whose names match `pattern`, sorted by path.
pub fn discover_search_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = glob::Pattern::new(pattern)
        .map_err(|e| Error::Validation(format!("invalid search file pattern '{pattern}': {e}")))?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| {
        Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", dir.display(), e)))
    })? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path.file_name().and_then(|n| n.to_str()).is_some_and(|n| matcher.matches(n));
        if matches {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(Error::Validation(format!(
            "no search-interest files matching '{}' in {}",
            pattern,
            dir.display()
        )));
    }
    Ok(files)
}

/// Load and concatenate every search-interest file in `dir`.
pub fn load_search_interest(dir: &Path, cfg: &PipelineConfig) -> Result<Vec<RawSearchRecord>> {
    let files = discover_search_files(dir, &cfg.inputs.search_pattern)?;
    let cols = &cfg.columns.search;

    let mut out = Vec::new();
    for path in &files {
        let t = read_table(path, cfg)?;
        let i_name = t.column_index(&cols.institution)?;
        let i_kw = t.column_index(&cols.keyword)?;
        let i_period = t.column_index(&cols.period)?;
        let i_index = t.column_index(&cols.index)?;

        for r in 0..t.len() {
            out.push(RawSearchRecord {
                institution_name: t.cell(r, i_name),
                keyword: t.cell(r, i_kw),
                period: t.cell(r, i_period),
                raw_index: t.cell(r, i_index),
            });
        }
        tracing::info!(path = %path.display(), rows = t.len(), "loaded search-interest file");
    }

    tracing::info!(files = files.len(), rows = out.len(), "search-interest dataset loaded");
    Ok(out)
}

/// Load the identifier crosswalk.
pub fn load_identifiers(path: &Path, cfg: &PipelineConfig) -> Result<Vec<RawIdentifierRecord>> {
    let t = read_table(path, cfg)?;
    let cols = &cfg.columns.identifier;
    let i_name = t.column_index(&cols.institution)?;
    let i_opeid = t.column_index(&cols.opeid)?;
    let i_unitid = t.column_index(&cols.unitid)?;

    let out: Vec<RawIdentifierRecord> = (0..t.len())
        .map(|r| RawIdentifierRecord {
            institution_name: t.cell(r, i_name),
            opeid: t.cell(r, i_opeid),
            unitid: t.cell(r, i_unitid),
        })
        .collect();

    tracing::info!(path = %path.display(), rows = out.len(), "loaded identifier crosswalk");
    Ok(out)
}

/// Load the selected outcome columns.
pub fn load_outcomes(path: &Path, cfg: &PipelineConfig) -> Result<Vec<RawOutcomesRecord>> {
    let t = read_table(path, cfg)?;
    let cols = &cfg.columns.outcomes;
    let i_unitid = t.column_index(&cols.unitid)?;
    let i_opeid = t.column_index(&cols.opeid)?;
    let i_degree = t.column_index(&cols.degree)?;
    let i_state = t.column_index(&cols.state)?;
    let i_locale = t.column_index(&cols.locale)?;
    let i_control = t.column_index(&cols.control)?;
    let i_earn = t.column_index(&cols.earnings)?;
    let i_flags: Vec<usize> =
        cols.minority_serving.iter().map(|c| t.column_index(c)).collect::<Result<_>>()?;

    let out: Vec<RawOutcomesRecord> = (0..t.len())
        .map(|r| RawOutcomesRecord {
            unitid: t.cell(r, i_unitid),
            opeid: t.cell(r, i_opeid),
            degree: t.cell(r, i_degree),
            state: t.cell(r, i_state),
            locale: t.cell(r, i_locale),
            control: t.cell(r, i_control),
            minority_flags: i_flags.iter().map(|&j| t.cell(r, j)).collect(),
            earnings: t.cell(r, i_earn),
        })
        .collect();

    tracing::info!(path = %path.display(), rows = out.len(), "loaded outcomes dataset");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("sct_load_{}_{}", std::process::id(), name));
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    #[test]
    fn discovers_sorted_matching_files() {
        let dir = tmp_dir("discover");
        for name in ["trends_up_to_b.csv", "trends_up_to_a.csv", "other.csv"] {
            std::fs::write(dir.join(name), "schname,keyword,monthorweek,index\n").unwrap();
        }
        let files = discover_search_files(&dir, "trends_up_to_*.csv").unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["trends_up_to_a.csv", "trends_up_to_b.csv"]);

        assert!(discover_search_files(&dir, "nothing_*.csv").is_err());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = tmp_dir("missing_col");
        let p = dir.join("ids.csv");
        std::fs::write(&p, "schname,unitid\nA,1\n").unwrap();
        let err = load_identifiers(&p, &PipelineConfig::default()).unwrap_err();
        assert!(err.to_string().contains("opeid"), "{err}");
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn outcomes_keep_sentinels_for_the_cleaner() {
        let dir = tmp_dir("outcomes");
        let p = dir.join("scorecard.csv");
        std::fs::write(
            &p,
            "UNITID,OPEID,PREDDEG,STABBR,LOCALE,CONTROL,HBCU,md_earn_wne_p10-REPORTED-EARNINGS\n\
             1,10,3,CA,12,1,0,PrivacySuppressed\n\
             2,20,3,NY,,2,1,70000\n",
        )
        .unwrap();
        let rows = load_outcomes(&p, &PipelineConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].earnings.as_deref(), Some("PrivacySuppressed"));
        assert_eq!(rows[1].locale, None);
        assert_eq!(rows[1].minority_flags, vec![Some("1".to_string())]);
        std::fs::remove_dir_all(dir).ok();
    }
}
