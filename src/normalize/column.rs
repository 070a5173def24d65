//! Header resolution: maps each [`ColumnRole`] onto a header of the raw table.

use crate::error::LoadSheetError;
use log::info;
use serde::Deserialize;
use std::fmt::Display;

/// Logical columns the normalizer looks for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Run,
    Driver1,
    Driver2,
    Truck,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [Self::Run, Self::Driver1, Self::Driver2, Self::Truck];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "Run",
            Self::Driver1 => "Driver 1",
            Self::Driver2 => "Driver 2",
            Self::Truck => "Truck",
        }
    }

    /// Whether normalization fails when this role has no matching header.
    pub const fn is_required(&self) -> bool {
        !matches!(self, Self::Driver2)
    }
}

impl Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered alias lists per role. Earlier aliases take priority, so specific
/// aliases must precede generic fallbacks.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasTable {
    pub run: Vec<String>,
    pub driver1: Vec<String>,
    pub driver2: Vec<String>,
    pub truck: Vec<String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        fn owned(aliases: &[&str]) -> Vec<String> {
            aliases.iter().map(|alias| alias.to_string()).collect()
        }
        AliasTable {
            run: owned(&["run"]),
            driver1: owned(&["driver1", "firstdriver", "driver"]),
            driver2: owned(&["driver2", "co-driver", "codriver", "seconddriver"]),
            truck: owned(&["truck", "vehicle", "rego"]),
        }
    }
}

impl AliasTable {
    pub fn aliases(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Run => &self.run,
            ColumnRole::Driver1 => &self.driver1,
            ColumnRole::Driver2 => &self.driver2,
            ColumnRole::Truck => &self.truck,
        }
    }
}

/// Lower-cases `text` and removes whitespace and underscores.
pub fn clean_header(text: &str) -> String {
    text.chars()
        .filter(|character| !character.is_whitespace() && *character != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Header indexes located for each role of one raw table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub run: usize,
    pub driver1: usize,
    pub driver2: Option<usize>,
    pub truck: usize,
}

impl ResolvedColumns {
    pub fn index(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Run => Some(self.run),
            ColumnRole::Driver1 => Some(self.driver1),
            ColumnRole::Driver2 => self.driver2,
            ColumnRole::Truck => Some(self.truck),
        }
    }
}

/// Resolves every role against `headers`. A header serves at most one role.
///
/// Aliases are tried rank by rank across all roles, so a specific alias of one
/// role (`driver2`) claims its header before a generic fallback of another
/// role (`driver`) can reach it. Within a role the first alias with a match
/// wins, and among headers the leftmost unclaimed match is taken.
///
/// # Errors
///
/// Returns [`LoadSheetError::MissingColumns`] listing each required role
/// without a match, together with all observed headers.
pub fn resolve_columns(aliases: &AliasTable, headers: &[String]) -> Result<ResolvedColumns, LoadSheetError> {
    let found = claim_headers(aliases, headers);
    let missing = found
        .iter()
        .filter(|(role, index)| role.is_required() && index.is_none())
        .map(|(role, _)| *role)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(LoadSheetError::MissingColumns {
            missing,
            headers: headers.to_vec(),
        });
    }

    let [(_, Some(run)), (_, Some(driver1)), (_, driver2), (_, Some(truck))] = found else {
        unreachable!("required roles were checked above");
    };
    let resolved = ResolvedColumns { run, driver1, driver2, truck };
    for role in ColumnRole::ALL {
        match resolved.index(role) {
            Some(index) => info!("Column {} resolved to header '{}'", role, headers[index]),
            None => info!("Column {} not present; defaulting to empty", role),
        }
    }
    Ok(resolved)
}

fn claim_headers(aliases: &AliasTable, headers: &[String]) -> [(ColumnRole, Option<usize>); 4] {
    let cleaned = headers.iter().map(|header| clean_header(header)).collect::<Vec<_>>();
    let mut claimed = vec![false; headers.len()];
    let mut found = ColumnRole::ALL.map(|role| (role, None::<usize>));
    let ranks = ColumnRole::ALL
        .iter()
        .map(|role| aliases.aliases(*role).len())
        .max()
        .unwrap_or(0);

    for rank in 0..ranks {
        for (role, index) in found.iter_mut().filter(|(_, index)| index.is_none()) {
            let Some(alias) = aliases.aliases(*role).get(rank).map(|alias| clean_header(alias)) else {
                continue;
            };
            if alias.is_empty() {
                continue;
            }
            let position = cleaned
                .iter()
                .zip(&claimed)
                .position(|(header, taken)| !taken && header.contains(&alias));
            if let Some(position) = position {
                claimed[position] = true;
                *index = Some(position);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[googletest::test]
    fn clean_header_strips_space_and_underscore() {
        expect_that!(clean_header(" Driver_ 1\t"), eq("driver1"));
        expect_that!(clean_header("TRUCK No."), eq("truckno."));
    }

    #[googletest::test]
    fn resolves_case_and_spacing_variants() {
        let aliases = AliasTable::default();
        for names in [
            ["Run", "Driver 1", "Driver 2", "Truck"],
            ["RUN #", "driver1", "DRIVER_2", "truck rego"],
            ["run no", "Driver  1", "driver 2", " Truck "],
        ] {
            let resolved = resolve_columns(&aliases, &headers(&names)).unwrap();
            expect_that!(
                resolved,
                eq(ResolvedColumns { run: 0, driver1: 1, driver2: Some(2), truck: 3 })
            );
        }
    }

    #[googletest::test]
    fn specific_alias_beats_generic_fallback() {
        // "Driver 2" comes first, but "driver1" is tried before the bare "driver".
        let resolved = resolve_columns(
            &AliasTable::default(),
            &headers(&["Driver 2", "Driver 1", "Run", "Truck"]),
        )
        .unwrap();
        expect_that!(resolved.driver1, eq(1));
        expect_that!(resolved.driver2, eq(Some(0)));
    }

    #[googletest::test]
    fn generic_driver_alias_is_a_fallback() {
        let resolved = resolve_columns(
            &AliasTable::default(),
            &headers(&["Run", "Driver", "Co-Driver", "Vehicle"]),
        )
        .unwrap();
        expect_that!(resolved.driver1, eq(1));
        expect_that!(resolved.driver2, eq(Some(2)));
        expect_that!(resolved.truck, eq(3));
    }

    #[googletest::test]
    fn missing_driver2_is_not_a_failure() {
        let resolved =
            resolve_columns(&AliasTable::default(), &headers(&["Run", "Driver 1", "Truck"])).unwrap();
        expect_that!(resolved.driver2, eq(None));
    }

    #[googletest::test]
    fn missing_truck_is_reported_alone() {
        let observed = headers(&["Run", "Driver 1", "Driver 2", "Notes"]);
        let error = resolve_columns(&AliasTable::default(), &observed).unwrap_err();
        match error {
            LoadSheetError::MissingColumns { missing, headers } => {
                expect_that!(missing, eq(&vec![ColumnRole::Truck]));
                expect_that!(headers, eq(&observed));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[googletest::test]
    fn missing_roles_are_listed_in_role_order() {
        let error = resolve_columns(&AliasTable::default(), &headers(&["Date"])).unwrap_err();
        let LoadSheetError::MissingColumns { missing, .. } = error else {
            panic!("expected missing columns");
        };
        expect_that!(missing, eq(&vec![ColumnRole::Run, ColumnRole::Driver1, ColumnRole::Truck]));
    }

    #[googletest::test]
    fn custom_aliases_extend_resolution() {
        let aliases = AliasTable {
            truck: vec!["unit".to_owned()],
            ..AliasTable::default()
        };
        let resolved =
            resolve_columns(&aliases, &headers(&["Run", "Driver 1", "Unit ID"])).unwrap();
        expect_that!(resolved.truck, eq(2));
    }

    #[googletest::test]
    fn driver2_header_is_not_claimed_by_driver1_fallback() {
        for second in ["Driver 2", "Co-Driver"] {
            let observed = headers(&["Run", second, "Truck"]);
            let error = resolve_columns(&AliasTable::default(), &observed).unwrap_err();
            let LoadSheetError::MissingColumns { missing, .. } = error else {
                panic!("expected missing columns for {second}");
            };
            expect_that!(missing, eq(&vec![ColumnRole::Driver1]));
        }
    }

    #[googletest::test]
    fn each_header_serves_one_role() {
        let resolved = resolve_columns(
            &AliasTable::default(),
            &headers(&["Run", "Co-Driver", "Driver", "Truck"]),
        )
        .unwrap();
        expect_that!(resolved.driver1, eq(2));
        expect_that!(resolved.driver2, eq(Some(1)));
    }
}
