/*
[INPUT]:  Target address text, SelectionTree, optional description
[OUTPUT]: Immutable TaskRequest or a local ComposeError
[POS]:    Composition layer - pure request construction, no engine access
[UPDATE]: When target grammar or request fields change
*/

use std::net::Ipv4Addr;

use secprobe_adapter::{CaseId, CreateTaskRequest};
use thiserror::Error;

use crate::error::ConsoleError;
use crate::selection::SelectionTree;

/// Validation failures raised while building a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("invalid target address '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("no cases selected")]
    EmptySelection,
}

impl From<ComposeError> for ConsoleError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::InvalidTarget { target, reason } => {
                ConsoleError::InvalidTarget { target, reason }
            }
            ComposeError::EmptySelection => ConsoleError::EmptySelection,
        }
    }
}

/// A validated task request. `case_ids: None` means run every enabled case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    target: Ipv4Addr,
    target_text: String,
    case_ids: Option<Vec<CaseId>>,
    description: Option<String>,
}

impl TaskRequest {
    pub fn target(&self) -> Ipv4Addr {
        self.target
    }

    /// Target exactly as the operator typed it.
    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub fn case_ids(&self) -> Option<&[CaseId]> {
        self.case_ids.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_run_all(&self) -> bool {
        self.case_ids.is_none()
    }

    pub fn to_create_request(&self) -> CreateTaskRequest {
        CreateTaskRequest {
            target_ip: self.target_text.clone(),
            description: self.description.clone(),
            case_ids: self.case_ids.clone(),
        }
    }
}

/// Build a request from the current selection.
///
/// The target is checked first, so an invalid address is reported even when
/// the selection is also empty.
pub fn build_request(
    target: &str,
    selection: &SelectionTree,
    description: Option<&str>,
) -> Result<TaskRequest, ComposeError> {
    let address = parse_target(target)?;

    let case_ids = if selection.run_all() {
        None
    } else {
        if selection.selected().is_empty() {
            return Err(ComposeError::EmptySelection);
        }
        Some(selection.selected().iter().copied().collect())
    };

    let description = description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    Ok(TaskRequest {
        target: address,
        target_text: target.to_string(),
        case_ids,
        description,
    })
}

/// Parse a dotted-quad IPv4 address: four decimal octets of one to three
/// digits, each at most 255. Leading zeros are accepted.
pub fn parse_target(target: &str) -> Result<Ipv4Addr, ComposeError> {
    let invalid = |reason: String| ComposeError::InvalidTarget {
        target: target.to_string(),
        reason,
    };

    let parts: Vec<&str> = target.split('.').collect();
    if parts.len() != 4 {
        return Err(invalid(format!("expected 4 octets, found {}", parts.len())));
    }

    let mut octets = [0u8; 4];
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(format!("octet {} '{part}' is not a decimal number", index + 1)));
        }
        let value: u16 = part
            .parse()
            .map_err(|_| invalid(format!("octet {} '{part}' is not a decimal number", index + 1)))?;
        octets[index] = u8::try_from(value)
            .map_err(|_| invalid(format!("octet {} is out of range: {value}", index + 1)))?;
    }

    Ok(Ipv4Addr::from(octets))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::catalog::fixtures::catalog;

    fn explicit_tree() -> SelectionTree {
        let mut tree = SelectionTree::new(Arc::new(catalog()));
        tree.set_run_all(false);
        tree
    }

    #[rstest]
    #[case("10.0.0.5", [10, 0, 0, 5])]
    #[case("0.0.0.0", [0, 0, 0, 0])]
    #[case("255.255.255.255", [255, 255, 255, 255])]
    #[case("192.168.001.010", [192, 168, 1, 10])]
    fn test_valid_targets(#[case] input: &str, #[case] expected: [u8; 4]) {
        assert_eq!(parse_target(input), Ok(Ipv4Addr::from(expected)));
    }

    #[rstest]
    #[case("192.168.1.999")]
    #[case("256.1.1.1")]
    #[case("1.2.3")]
    #[case("1.2.3.4.5")]
    #[case("1..2.3")]
    #[case("a.b.c.d")]
    #[case("1.2.3.0004")]
    #[case(" 1.2.3.4")]
    #[case("+1.2.3.4")]
    #[case("")]
    fn test_invalid_targets(#[case] input: &str) {
        assert!(matches!(
            parse_target(input),
            Err(ComposeError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_out_of_range_reason_names_octet() {
        let err = parse_target("192.168.1.999").expect_err("out of range");
        assert_eq!(
            err,
            ComposeError::InvalidTarget {
                target: "192.168.1.999".to_string(),
                reason: "octet 4 is out of range: 999".to_string(),
            }
        );
    }

    #[test]
    fn test_explicit_empty_selection() {
        let tree = explicit_tree();
        assert_eq!(
            build_request("10.0.0.5", &tree, None),
            Err(ComposeError::EmptySelection)
        );
    }

    #[test]
    fn test_invalid_target_reported_before_empty_selection() {
        let tree = explicit_tree();
        assert!(matches!(
            build_request("10.0.0", &tree, None),
            Err(ComposeError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_explicit_ids_are_sorted() {
        let mut tree = explicit_tree();
        tree.toggle_case(5);
        tree.toggle_case(1);
        tree.toggle_case(3);
        let request = build_request("10.0.0.5", &tree, Some("  weekly sweep ")).expect("request");
        assert_eq!(request.case_ids(), Some(&[1, 3, 5][..]));
        assert_eq!(request.description(), Some("weekly sweep"));
        assert!(!request.is_run_all());
    }

    #[test]
    fn test_run_all_has_no_id_list() {
        let mut tree = explicit_tree();
        tree.select_all();
        tree.set_run_all(true);
        let request = build_request("10.0.0.5", &tree, Some("   ")).expect("request");
        assert!(request.is_run_all());
        assert_eq!(request.description(), None);
        assert_eq!(request.to_create_request().case_ids, None);
    }

    #[test]
    fn test_select_all_by_hand_stays_explicit() {
        let mut tree = explicit_tree();
        tree.select_all();
        let request = build_request("10.0.0.5", &tree, None).expect("request");
        assert_eq!(request.case_ids().map(<[i64]>::len), Some(5));
    }
}
