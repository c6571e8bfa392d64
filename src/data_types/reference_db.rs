
use anyhow::Context;
use log::info;
use std::path::Path;

use crate::data_types::nomenclature::NomenclatureTable;
use crate::data_types::phenotype_table::PhenotypeTable;
use crate::data_types::tool_priority::ToolPriorityTable;
use crate::util::json_io::load_json;

/// The bundle of reference tables the engine runs against: nomenclature map,
/// tool-priority ranking, and function/phenotype map. Loaded once before any
/// processing starts and shared immutably across all worker threads.
#[derive(Clone, Debug)]
pub struct ReferenceTables {
    /// Raw-spelling to canonical-designation rules
    nomenclature: NomenclatureTable,
    /// Per-gene tool reliability ranking
    priorities: ToolPriorityTable,
    /// Allele-function and function-pair phenotype rules
    phenotypes: PhenotypeTable
}

impl ReferenceTables {
    /// Direct constructor, mostly for synthetic tables in tests
    pub fn new(nomenclature: NomenclatureTable, priorities: ToolPriorityTable, phenotypes: PhenotypeTable) -> Self {
        Self {
            nomenclature, priorities, phenotypes
        }
    }

    /// Loads all tables from their JSON configuration files.
    /// A missing priority file is allowed (the resolver then falls through to
    /// majority voting everywhere); the other two tables are required.
    /// # Arguments
    /// * `nomenclature_fn` - nomenclature table JSON
    /// * `phenotype_fn` - function/phenotype table JSON
    /// * `priority_fn` - optional tool-priority ranking JSON
    /// # Errors
    /// * if a required file fails to open or deserialize
    pub fn from_files(nomenclature_fn: &Path, phenotype_fn: &Path, priority_fn: Option<&Path>) -> anyhow::Result<Self> {
        let nomenclature: NomenclatureTable = load_json(nomenclature_fn)
            .context("Error while loading nomenclature table:")?;
        info!("Loaded nomenclature table, version {:?}", nomenclature.version());

        let phenotypes: PhenotypeTable = load_json(phenotype_fn)
            .context("Error while loading phenotype table:")?;
        info!("Loaded phenotype table, version {:?}", phenotypes.version());

        let priorities: ToolPriorityTable = match priority_fn {
            Some(filename) => {
                let table: ToolPriorityTable = load_json(filename)
                    .context("Error while loading tool priority table:")?;
                info!("Loaded tool priority table, version {:?}", table.version());
                table
            },
            None => {
                info!("No tool priority table provided, priority-override resolution is disabled.");
                ToolPriorityTable::empty()
            }
        };

        Ok(Self {
            nomenclature, priorities, phenotypes
        })
    }

    // getters
    pub fn nomenclature(&self) -> &NomenclatureTable {
        &self.nomenclature
    }

    pub fn priorities(&self) -> &ToolPriorityTable {
        &self.priorities
    }

    pub fn phenotypes(&self) -> &PhenotypeTable {
        &self.phenotypes
    }
}
