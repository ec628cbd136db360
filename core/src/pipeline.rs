//! The daily ELT pipeline, declared as a task graph.
//!
//! Layers run in this order, each reading only what earlier layers
//! produced:
//!   PreLoading   → generate raw files, upload them, remove local copies
//!   Landing      → load raw files into day-partitioned warehouse tables
//!   Source       → cleaned copies of the raw tables            (dbt)
//!   Intermediate → shared helper models                        (dbt)
//!   Final        → report-ready models                         (dbt)
//!   Consumption  → pass-through views for downstream tools     (dbt)
//!
//! Nothing here executes a task. The graph is declared, validated and
//! rendered; a scheduler runs it.

pub mod graph;

pub use graph::TaskGraph;

use crate::{config::PipelineSettings, error::GenResult, types::RecordCategory};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Control,
    PreLoading,
    Landing,
    Source,
    Intermediate,
    Final,
    Consumption,
}

impl Layer {
    pub fn group_id(&self) -> &'static str {
        match self {
            Self::Control      => "control",
            Self::PreLoading   => "pre_loading",
            Self::Landing      => "level1_landing",
            Self::Source       => "level2_source",
            Self::Intermediate => "level3_intermediate",
            Self::Final        => "level4_final",
            Self::Consumption  => "level5_consumption",
        }
    }

    /// dbt model folder for transformation layers.
    pub fn model_folder(&self) -> Option<&'static str> {
        match self {
            Self::Source       => Some("l2_source"),
            Self::Intermediate => Some("l3_intermediate"),
            Self::Final        => Some("l4_final"),
            Self::Consumption  => Some("l5_consumption"),
            _                  => None,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DbtCommand {
    Run,
    Test,
}

impl DbtCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Run  => "run",
            Self::Test => "test",
        }
    }
}

/// Where dbt finds its project and profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbtProject {
    pub project_dir:  PathBuf,
    pub profiles_dir: PathBuf,
}

impl DbtProject {
    /// Project and profiles share one directory.
    pub fn at(dir: &Path) -> Self {
        Self {
            project_dir:  dir.to_path_buf(),
            profiles_dir: dir.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operator {
    Empty,
    GenerateRawData,
    UploadToObjectStore {
        src:    String,
        bucket: String,
        object: String,
    },
    RemoveLocalFile {
        path: String,
    },
    LoadToWarehouse {
        project:         String,
        bucket:          String,
        source_objects:  String,
        table:           String,
        partition_field: String,
    },
    Dbt {
        command: DbtCommand,
        model:   String,
    },
}

impl Operator {
    /// Shell command for dbt tasks, `None` for everything else.
    pub fn render_command(&self, project: &DbtProject) -> Option<String> {
        match self {
            Self::Dbt { command, model } => Some(format!(
                "dbt {} --project-dir {} --profiles-dir {} --select {model}",
                command.verb(),
                project.project_dir.display(),
                project.profiles_dir.display(),
            )),
            _ => None,
        }
    }

    /// One-line human description.
    pub fn describe(&self) -> String {
        match self {
            Self::Empty => "no-op".into(),
            Self::GenerateRawData => "generate raw users, preferences and transactions".into(),
            Self::UploadToObjectStore { src, bucket, object } => {
                format!("upload {src} to {bucket}/{object}")
            }
            Self::RemoveLocalFile { path } => format!("remove {path}"),
            Self::LoadToWarehouse { project, bucket, source_objects, table, partition_field } => {
                format!(
                    "append {bucket}/{source_objects} into {project}.{table} partitioned by {partition_field}"
                )
            }
            Self::Dbt { command, model } => format!("dbt {} {model}", command.verb()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id:       String,
    pub layer:    Layer,
    pub operator: Operator,
}

impl Task {
    pub fn new(id: impl Into<String>, layer: Layer, operator: Operator) -> Self {
        Self { id: id.into(), layer, operator }
    }
}

/// Add `dbt_run_<base>` and `dbt_test_<base>` for `model`, with the
/// test depending on the run. Returns both ids.
pub fn dbt_run_and_test(
    graph: &mut TaskGraph,
    layer: Layer,
    base_id: &str,
    model: &str,
) -> GenResult<(String, String)> {
    let run_id = format!("dbt_run_{base_id}");
    let test_id = format!("dbt_test_{base_id}");
    graph.add_task(Task::new(
        &run_id,
        layer,
        Operator::Dbt { command: DbtCommand::Run, model: model.to_string() },
    ))?;
    graph.add_task(Task::new(
        &test_id,
        layer,
        Operator::Dbt { command: DbtCommand::Test, model: model.to_string() },
    ))?;
    graph.add_edge(&run_id, &test_id)?;
    Ok((run_id, test_id))
}

/// A declared pipeline and the settings it was built from.
pub struct Pipeline {
    pub settings: PipelineSettings,
    pub graph:    TaskGraph,
}

impl Pipeline {
    pub fn dbt_project(&self) -> DbtProject {
        DbtProject::at(&self.settings.dbt_project_dir)
    }
}

/// Each final model feeds one `report_<name>` consumption model.
const FINAL_MODELS: [&str; 4] = [
    "new_users_last_30days",
    "user_activity_summary",
    "user_daily_transactions",
    "user_latest_preferences",
];

const HELPER_DAILY_TXNS: &str = "helper_user_daily_transactions";
const PREFS_EXTRA_INFO: &str = "user_preferences_extra_info";

/// Declare the daily ELT graph for the three raw tables.
pub fn challenge_pipeline(settings: &PipelineSettings) -> GenResult<Pipeline> {
    settings.validate()?;
    let mut g = TaskGraph::new();
    let ns = &settings.dbt_namespace;
    let model = |layer: Layer, name: &str| {
        format!("{ns}.{}.{name}", layer.model_folder().unwrap_or_default())
    };

    g.add_task(Task::new("start", Layer::Control, Operator::Empty))?;
    g.add_task(Task::new("generate_raw_data", Layer::PreLoading, Operator::GenerateRawData))?;
    g.add_edge("start", "generate_raw_data")?;

    // Pre-loading and landing, per raw table.
    for category in RecordCategory::ALL {
        let table = category.table_name();
        let raw_file = category.raw_file_name();
        let upload = format!("upload_file_{table}_to_gcs");
        let remove = format!("remove_file_{table}");
        g.add_task(Task::new(
            &upload,
            Layer::PreLoading,
            Operator::UploadToObjectStore {
                src:    raw_file.clone(),
                bucket: settings.bucket.clone(),
                object: format!("{}/{table}/ds={{{{ ds }}}}/file.csv", settings.object_prefix),
            },
        ))?;
        g.add_task(Task::new(
            &remove,
            Layer::PreLoading,
            Operator::RemoveLocalFile { path: raw_file },
        ))?;
        g.add_edge("generate_raw_data", &upload)?;
    }
    for category in RecordCategory::ALL {
        let table = category.table_name();
        g.add_task(Task::new(
            format!("landing_raw_{table}"),
            Layer::Landing,
            Operator::LoadToWarehouse {
                project:         settings.warehouse_project.clone(),
                bucket:          settings.bucket.clone(),
                source_objects:  format!("{}/{table}/ds={{{{ ds }}}}/*.csv", settings.object_prefix),
                table:           format!("{}.raw_{table}", settings.landing_dataset),
                partition_field: settings.partition_field.clone(),
            },
        ))?;
    }
    g.group_edges(Layer::PreLoading, Layer::Landing)?;

    for category in RecordCategory::ALL {
        let table = category.table_name();
        let source = format!("dbt_run_source_{table}");
        g.add_task(Task::new(
            &source,
            Layer::Source,
            Operator::Dbt { command: DbtCommand::Run, model: model(Layer::Source, table) },
        ))?;
        let upload = format!("upload_file_{table}_to_gcs");
        let remove = format!("remove_file_{table}");
        let landing = format!("landing_raw_{table}");
        g.chain(&[upload.as_str(), remove.as_str(), landing.as_str(), source.as_str()])?;
    }

    for name in [HELPER_DAILY_TXNS, PREFS_EXTRA_INFO] {
        g.add_task(Task::new(
            format!("dbt_run_intermediate_{name}"),
            Layer::Intermediate,
            Operator::Dbt { command: DbtCommand::Run, model: model(Layer::Intermediate, name) },
        ))?;
    }
    let helper = format!("dbt_run_intermediate_{HELPER_DAILY_TXNS}");
    let extra_info = format!("dbt_run_intermediate_{PREFS_EXTRA_INFO}");
    g.add_edge("dbt_run_source_transactions", &helper)?;
    g.add_edge("dbt_run_source_user_preferences", &extra_info)?;

    // Final and consumption; each final model feeds exactly one report.
    // With dbt tests enabled the report waits for the test, not the run.
    let mut final_tails = Vec::with_capacity(FINAL_MODELS.len());
    for name in FINAL_MODELS {
        let tail = if settings.dbt_tests {
            let base = format!("final_{name}");
            let (_, test) = dbt_run_and_test(&mut g, Layer::Final, &base, &model(Layer::Final, name))?;
            test
        } else {
            let head = format!("dbt_run_final_{name}");
            g.add_task(Task::new(
                &head,
                Layer::Final,
                Operator::Dbt { command: DbtCommand::Run, model: model(Layer::Final, name) },
            ))?;
            head
        };
        final_tails.push(tail);
    }
    let upstreams: [(&str, &[&str]); 4] = [
        ("new_users_last_30days", &["dbt_run_source_transactions", "dbt_run_source_users"]),
        ("user_activity_summary", &[helper.as_str(), extra_info.as_str()]),
        ("user_daily_transactions", &[helper.as_str()]),
        ("user_latest_preferences", &["dbt_run_source_users", extra_info.as_str()]),
    ];
    for (name, ups) in upstreams {
        for &up in ups {
            g.add_edge(up, &format!("dbt_run_final_{name}"))?;
        }
    }

    g.add_task(Task::new("end", Layer::Control, Operator::Empty))?;
    for (name, tail) in FINAL_MODELS.iter().zip(&final_tails) {
        let report = format!("report_{name}");
        let id = format!("dbt_run_consumption_{report}");
        g.add_task(Task::new(
            &id,
            Layer::Consumption,
            Operator::Dbt { command: DbtCommand::Run, model: model(Layer::Consumption, &report) },
        ))?;
        g.chain(&[tail.as_str(), id.as_str(), "end"])?;
    }

    // Surface cycles at declaration time rather than at schedule time.
    g.topological_order()?;
    log::debug!("Declared pipeline '{}' with {} tasks", settings.dag_id, g.len());

    Ok(Pipeline { settings: settings.clone(), graph: g })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbt_command_renders_with_selector() {
        let op = Operator::Dbt {
            command: DbtCommand::Test,
            model:   "challenge.l2_source.users".into(),
        };
        let cmd = op.render_command(&DbtProject::at(Path::new("/opt/dbt/ancient")));
        assert_eq!(
            cmd.as_deref(),
            Some("dbt test --project-dir /opt/dbt/ancient --profiles-dir /opt/dbt/ancient --select challenge.l2_source.users")
        );
        assert_eq!(Operator::Empty.render_command(&DbtProject::at(Path::new("."))), None);
    }

    #[test]
    fn run_and_test_pair_uses_both_commands() {
        let mut g = TaskGraph::new();
        let (run, test) = dbt_run_and_test(&mut g, Layer::Final, "final_x", "challenge.l4_final.x").unwrap();
        assert_eq!(run, "dbt_run_final_x");
        assert_eq!(test, "dbt_test_final_x");
        assert!(matches!(
            g.get(&test).unwrap().operator,
            Operator::Dbt { command: DbtCommand::Test, .. }
        ));
        assert_eq!(g.upstream(&test).unwrap()[0].id, run);
    }
}
