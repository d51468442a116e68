/*!
Helpers pour charger et valider les contrats HTTP servmon

Facilite les tests en fournissant des utilitaires pour:
- Charger les contrats embarqués depuis `contracts/http/<nom>.json`
- Valider un payload JSON contre le JSON Schema d'un contrat
- Retrouver le contrat d'une route (méthode + chemin)
*/

use anyhow::{anyhow, bail, Result};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Contrats livrés avec le dépôt, embarqués à la compilation
const BUILTIN_CONTRACTS: [(&str, &str); 3] = [
    ("metrics_snapshot.json", include_str!("../../contracts/http/metrics_snapshot.json")),
    ("thresholds_update.json", include_str!("../../contracts/http/thresholds_update.json")),
    ("system_health.json", include_str!("../../contracts/http/system_health.json")),
];

#[derive(Clone)]
pub struct Contract {
    pub name: String,
    pub method: String,
    pub route: String,
    pub schema: Value,
    validator: Arc<JSONSchema>,
}

impl Contract {
    /// Construit un contrat ; le schéma (draft 7) est compilé une seule fois
    pub fn from_json(json: &Value, fallback_name: &str) -> Result<Self> {
        let text = |key: &str, default: &str| {
            json.get(key).and_then(|v| v.as_str()).unwrap_or(default).to_string()
        };

        let name = text("name", fallback_name);
        let schema = json
            .get("schema")
            .cloned()
            .ok_or_else(|| anyhow!("contract {name} has no schema"))?;
        let validator = JSONSchema::compile(&schema)
            .map_err(|e| anyhow!("contract {name}: invalid schema at {}: {e}", e.schema_path))?;

        Ok(Contract {
            method: text("method", "GET"),
            route: text("route", ""),
            name,
            schema,
            validator: Arc::new(validator),
        })
    }

    /// Valide un payload ; chaque erreur est préfixée par son chemin JSON (pointer)
    pub fn validate(&self, payload: &Value) -> Result<()> {
        if let Err(errors) = self.validator.validate(payload) {
            let report = errors
                .map(|e| format!("{}: {e}", e.instance_path))
                .collect::<Vec<_>>()
                .join("; ");
            bail!("{} violates contract: {report}", self.name);
        }
        Ok(())
    }
}

/// Registre des contrats HTTP
pub struct ContractLoader {
    contracts: HashMap<String, Contract>,
}

impl ContractLoader {
    /// Loader pré-rempli avec les contrats embarqués (indépendant du cwd)
    pub fn with_builtin_contracts() -> Self {
        let mut contracts = HashMap::new();
        for (file, content) in BUILTIN_CONTRACTS {
            let parsed = serde_json::from_str::<Value>(content)
                .map_err(anyhow::Error::from)
                .and_then(|json| Contract::from_json(&json, file.trim_end_matches(".json")));
            match parsed {
                Ok(contract) => {
                    log::debug!("📜 Loaded contract: {}", contract.name);
                    contracts.insert(contract.name.clone(), contract);
                }
                Err(e) => log::warn!("⚠️ Builtin contract {file} is invalid: {e}"),
            }
        }
        Self { contracts }
    }

    /// Récupère un contrat par nom
    pub fn get_contract(&self, name: &str) -> Option<&Contract> {
        self.contracts.get(name)
    }

    /// Trouve le contrat associé à une route
    pub fn contract_for_route(&self, method: &str, route: &str) -> Option<&Contract> {
        self.contracts
            .values()
            .find(|c| c.route == route && c.method.eq_ignore_ascii_case(method))
    }

    /// Valide un payload contre le contrat nommé
    pub fn validate(&self, name: &str, payload: &Value) -> Result<()> {
        match self.get_contract(name) {
            Some(contract) => contract.validate(payload),
            None => bail!("Contract not found: {name}"),
        }
    }
}
