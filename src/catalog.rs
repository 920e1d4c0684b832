//! Block catalog: the fixed, read-only set of building blocks a quiz draws from.
//!
//! The built-in catalog is compiled in; a TOML config may replace it wholesale
//! (see `config::GameConfig::blocks`). Either way it is validated once and then
//! never mutated for the lifetime of the process.

use std::collections::HashSet;

use crate::domain::BuildingBlock;
use crate::error::QuizError;

#[derive(Clone, Debug)]
pub struct Catalog {
  blocks: Vec<BuildingBlock>,
}

impl Catalog {
  /// The compiled-in catalog.
  pub fn builtin() -> Self {
    Self { blocks: builtin_blocks() }
  }

  /// Build a catalog from externally supplied blocks.
  /// Rejects empty catalogs, duplicate ids and blank display metadata.
  pub fn from_blocks(blocks: Vec<BuildingBlock>) -> Result<Self, QuizError> {
    if blocks.is_empty() {
      return Err(QuizError::config("catalog must contain at least one block"));
    }
    let mut seen = HashSet::new();
    for b in &blocks {
      let blank = [&b.id, &b.name, &b.description, &b.category, &b.image_ref]
        .iter()
        .any(|s| s.trim().is_empty());
      if blank {
        return Err(QuizError::config(format!("block '{}' has empty fields", b.id)));
      }
      if !seen.insert(b.id.as_str()) {
        return Err(QuizError::config(format!("duplicate block id '{}'", b.id)));
      }
    }
    Ok(Self { blocks })
  }

  pub fn all(&self) -> &[BuildingBlock] {
    &self.blocks
  }

  pub fn get(&self, id: &str) -> Option<&BuildingBlock> {
    self.blocks.iter().find(|b| b.id == id)
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }
}

fn block(id: &str, name: &str, description: &str, category: &str, image_ref: &str) -> BuildingBlock {
  BuildingBlock {
    id: id.into(),
    name: name.into(),
    description: description.into(),
    category: category.into(),
    image_ref: image_ref.into(),
  }
}

fn builtin_blocks() -> Vec<BuildingBlock> {
  vec![
    block(
      "ed",
      "Educator (AKA ED)",
      "A composite building block which enables learning & capacity building use cases in multiple domains such as Education, Agriculture, Healthcare, etc.",
      "Learning",
      "https://sunbird.org/images/2023/08/18/Educator-Icon.png",
    ),
    block(
      "knowlg",
      "Librarian (AKA Knowlg)",
      "A set of tools and services that enable you to create, curate, publish, organize and discover learning resources. It can also enable recommendations for better business outcomes.",
      "Learning",
      "https://sunbird.org/images/2023/08/14/librarian.svg",
    ),
    block(
      "lern",
      "Learner (AKA Lern)",
      "A set of services and tools for managing learning interactions of users. It enables learning journeys of a user. It also enables collaboration through groups, discussion forums etc.",
      "Learning",
      "https://sunbird.org/images/2023/08/14/learner.svg",
    ),
    block(
      "obsrv",
      "Observer (AKA Obsrv)",
      "Enables observability by empowering systems to stream, process, store and analyze telemetry data. Designed to help almost any system become \u{201c}intelligent\u{201d} by enabling flexible measurability.",
      "Data",
      "https://sunbird.org/images/2023/08/14/obeserver.svg",
    ),
    block(
      "inquiry",
      "Examiner (AKA inQuiry)",
      "A set of tools to create and manage question banks with a variety of questions. It enables creation of Worksheets, Assessments, Exam Papers, Quizzes, Surveys etc. in a quick and easy way.",
      "Learning",
      "https://sunbird.org/images/2023/08/14/examiner.svg",
    ),
    block(
      "rc",
      "Authenticator (AKA RC)",
      "SB RC is a building block that allows for rapid building and deployment of electronic registries through configurable schemas and workflows. It provides microservices for credential issuance and management.",
      "Trust & Identity",
      "https://sunbird.org/images/2023/08/14/authenticator.svg",
    ),
    block(
      "quml",
      "Quizmaster (AKA QuML)",
      "Systematize question banks, easy to store, render and distribute questions so that they can be reused across systems, independent of authoring tools.",
      "Learning",
      "https://sunbird.org/images/2023/08/14/quizmaster.svg",
    ),
    block(
      "saral",
      "Digitiser (AKA Saral)",
      "An application that can digitize data that is on physical printed sheets. It provides a simple way of capturing structured information on a paper into digital format through a scan.",
      "Trust & Identity",
      "https://sunbird.org/images/2023/08/14/digitiser.svg",
    ),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_catalog_is_valid_and_ordered() {
    let cat = Catalog::builtin();
    assert_eq!(cat.len(), 8);
    assert_eq!(cat.all()[0].id, "ed");
    assert_eq!(cat.all()[7].id, "saral");
    // Re-validating the built-in data must succeed.
    assert!(Catalog::from_blocks(cat.all().to_vec()).is_ok());
    assert_eq!(cat.get("quml").map(|b| b.category.as_str()), Some("Learning"));
    assert!(cat.get("nope").is_none());
  }

  #[test]
  fn duplicate_ids_are_rejected() {
    let b = block("x", "X", "desc", "cat", "img");
    let err = Catalog::from_blocks(vec![b.clone(), b]).unwrap_err();
    assert!(matches!(err, QuizError::Configuration(_)));
  }

  #[test]
  fn empty_or_blank_catalogs_are_rejected() {
    assert!(Catalog::from_blocks(vec![]).is_err());
    let blank = block("x", "  ", "desc", "cat", "img");
    assert!(Catalog::from_blocks(vec![blank]).is_err());
  }
}
