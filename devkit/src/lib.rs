/*!
# Servmon DevKit - Utilitaires de test

Bibliothèque facilitant les tests du moteur et du kernel avec:
- Harness moteur déterministe (graine + horloge simulée)
- Vérification des invariants du moteur
- Chargement et validation des contrats HTTP JSON
*/

pub mod contract_helpers;
pub mod test_utils;

pub use contract_helpers::{Contract, ContractLoader};
pub use test_utils::TestHarness;
