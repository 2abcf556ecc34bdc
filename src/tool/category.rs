use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::EvalConfig;

/// The single-turn test categories of the benchmark.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TestCategory {
    // relevance and irrelevance
    LiveRelevance,
    Irrelevance,
    LiveIrrelevance,
    // ast
    Simple,
    LiveSimple,
    Multiple,
    LiveMultiple,
    Parallel,
    LiveParallel,
    ParallelMultiple,
    LiveParallelMultiple,
    // executable
    ExecSimple,
    ExecParallel,
    ExecMultiple,
    ExecParallelMultiple,
    // non-python
    Java,
    Javascript,
    Rest,
}

impl TestCategory {
    pub fn id(&self) -> u32 {
        match self {
            TestCategory::LiveRelevance => 1,
            TestCategory::Irrelevance => 2,
            TestCategory::LiveIrrelevance => 3,
            TestCategory::Simple => 4,
            TestCategory::LiveSimple => 5,
            TestCategory::Multiple => 6,
            TestCategory::LiveMultiple => 7,
            TestCategory::Parallel => 8,
            TestCategory::LiveParallel => 9,
            TestCategory::ParallelMultiple => 10,
            TestCategory::LiveParallelMultiple => 11,
            TestCategory::ExecSimple => 12,
            TestCategory::ExecParallel => 13,
            TestCategory::ExecMultiple => 14,
            TestCategory::ExecParallelMultiple => 15,
            TestCategory::Java => 16,
            TestCategory::Javascript => 17,
            TestCategory::Rest => 18,
        }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Prompt file name under the configured version prefix.
    pub fn prompt_file(&self, config: &EvalConfig) -> String {
        config.prompt_file_name(&self.name())
    }

    /// Whether a per-category possible-answer file exists. REST ground truth lives in its own
    /// position-indexed file and relevance categories have none.
    pub fn has_ground_truth(&self) -> bool {
        !matches!(
            self,
            TestCategory::LiveRelevance
                | TestCategory::Irrelevance
                | TestCategory::LiveIrrelevance
                | TestCategory::Rest
        )
    }

    pub fn is_live(&self) -> bool {
        self.name().starts_with("live_")
    }

    pub fn language(&self) -> Language {
        match self {
            TestCategory::Java => Language::Java,
            TestCategory::Javascript => Language::JavaScript,
            _ => Language::Python,
        }
    }

    /// `multiple` and `parallel` categories are graded as an unordered set of calls.
    pub fn is_multi_call(&self) -> bool {
        let name = self.name();
        name.contains("multiple") || name.contains("parallel")
    }

    pub fn is_parallel(&self) -> bool {
        self.name().contains("parallel")
    }

    pub fn in_collection(&self, collection: TestCollection) -> bool {
        collection.contains(*self)
    }
}

/// Overlapping groupings of categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TestCollection {
    All,
    SingleTurn,
    Live,
    NonLive,
    Ast,
    Executable,
    NonPython,
    Python,
    PythonAst,
    Irrelevance,
    Relevance,
}

impl TestCollection {
    pub fn contains(&self, category: TestCategory) -> bool {
        use TestCategory::*;
        match self {
            TestCollection::All | TestCollection::SingleTurn => true,
            TestCollection::Live => category.is_live(),
            TestCollection::NonLive => !category.is_live(),
            TestCollection::Ast => !TestCollection::Executable.contains(category),
            TestCollection::Executable => matches!(
                category,
                ExecSimple | ExecParallel | ExecMultiple | ExecParallelMultiple | Rest
            ),
            TestCollection::NonPython => matches!(category, Java | Javascript),
            TestCollection::Python => !matches!(category, Java | Javascript),
            TestCollection::PythonAst => {
                TestCollection::Ast.contains(category)
                    && TestCollection::Python.contains(category)
            }
            TestCollection::Irrelevance => matches!(category, Irrelevance | LiveIrrelevance),
            TestCollection::Relevance => matches!(category, LiveRelevance),
        }
    }

    pub fn categories(&self) -> Vec<TestCategory> {
        TestCategory::iter().filter(|c| self.contains(*c)).collect()
    }
}

/// Source language of a benchmark question's function signatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Java,
    JavaScript,
}
