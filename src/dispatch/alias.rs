//! Alias table: matcher names and titles -> canonical backend operations.
//!
//! Every name the matcher is known to answer with is listed in [`Alias::ALL`]
//! together with its titles from the function catalog. Lookup is an exact
//! comparison (trimmed, ASCII case-insensitive); anything else is unresolved.

use std::fmt;

use serde_json::{Map, Value};

/// Backend domains. Each has its own function and list key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Subscriptions,
    Products,
    Goals,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Subscriptions, Domain::Products, Domain::Goals];

    /// Logical backend name, also the list key of its responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Subscriptions => "subscriptions",
            Domain::Products => "products",
            Domain::Goals => "goals",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetSubscriptions,
    GetProducts,
    GetGoals,
    PutGoal,
    DeleteGoal,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::GetSubscriptions => "get_subscriptions",
            Operation::GetProducts => "get_products",
            Operation::GetGoals => "get_goals",
            Operation::PutGoal => "put_goal",
            Operation::DeleteGoal => "delete_goal",
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            Operation::GetSubscriptions => Domain::Subscriptions,
            Operation::GetProducts => Domain::Products,
            Operation::GetGoals | Operation::PutGoal | Operation::DeleteGoal => Domain::Goals,
        }
    }

    /// Parameters the backend expects unless the caller says otherwise.
    pub fn defaults(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Operation::GetSubscriptions | Operation::GetProducts => &[],
            Operation::GetGoals => &[("action", "get")],
            Operation::PutGoal => &[("action", "put")],
            Operation::DeleteGoal => &[("action", "delete")],
        }
    }

    /// The exact `action` string the goals backend accepts.
    pub fn goal_action(self) -> Option<&'static str> {
        match self {
            Operation::GetGoals => Some("get"),
            Operation::PutGoal => Some("put"),
            Operation::DeleteGoal => Some("delete"),
            Operation::GetSubscriptions | Operation::GetProducts => None,
        }
    }

    /// Write operations answer with a status instead of a record list.
    pub fn is_write(self) -> bool {
        matches!(self, Operation::PutGoal | Operation::DeleteGoal)
    }

    /// Goal operation named by an `action` parameter, in any case.
    pub fn from_goal_action(action: &str) -> Option<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "get" => Some(Operation::GetGoals),
            "put" => Some(Operation::PutGoal),
            "delete" => Some(Operation::DeleteGoal),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an alias picks its operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentRule {
    /// Always the same operation.
    Fixed(Operation),
    /// Goal management: an explicit `action` wins, then a `goal` payload means
    /// put, then a `goal_id` means delete, otherwise get.
    GoalIntent,
}

impl IntentRule {
    /// Every operation the rule can pick.
    pub fn candidates(self) -> Vec<Operation> {
        match self {
            IntentRule::Fixed(op) => vec![op],
            IntentRule::GoalIntent => {
                vec![Operation::GetGoals, Operation::PutGoal, Operation::DeleteGoal]
            }
        }
    }

    pub fn operation_for(self, parameters: &Map<String, Value>) -> Operation {
        match self {
            IntentRule::Fixed(op) => op,
            IntentRule::GoalIntent => {
                if let Some(op) = parameters
                    .get("action")
                    .and_then(Value::as_str)
                    .and_then(Operation::from_goal_action)
                {
                    op
                } else if parameters.get("goal").is_some_and(|v| !v.is_null()) {
                    Operation::PutGoal
                } else if parameters.get("goal_id").is_some_and(|v| !v.is_null()) {
                    Operation::DeleteGoal
                } else {
                    Operation::GetGoals
                }
            }
        }
    }
}

/// Names the matcher is known to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    GetSubscriptions,
    GetProducts,
    GetGoals,
    PutGoal,
    DeleteGoal,
    ManageGoals,
}

impl Alias {
    pub const ALL: [Alias; 6] = [
        Alias::GetSubscriptions,
        Alias::GetProducts,
        Alias::GetGoals,
        Alias::PutGoal,
        Alias::DeleteGoal,
        Alias::ManageGoals,
    ];

    pub fn function_id(self) -> &'static str {
        match self {
            Alias::GetSubscriptions => "get_subscriptions",
            Alias::GetProducts => "get_products",
            Alias::GetGoals => "get_goals",
            Alias::PutGoal => "put_goal",
            Alias::DeleteGoal => "delete_goal",
            Alias::ManageGoals => "manage_goals",
        }
    }

    /// Catalog titles that resolve to this alias.
    pub fn titles(self) -> &'static [&'static str] {
        match self {
            Alias::GetSubscriptions => &["Get User Subscriptions", "Get Subscriptions"],
            Alias::GetProducts => &["Get Financial Products", "Get Products"],
            Alias::GetGoals => &["Get Financial Goals"],
            Alias::PutGoal => &[],
            Alias::DeleteGoal => &[],
            Alias::ManageGoals => &["Manage Financial Goals"],
        }
    }

    pub fn rule(self) -> IntentRule {
        match self {
            Alias::GetSubscriptions => IntentRule::Fixed(Operation::GetSubscriptions),
            Alias::GetProducts => IntentRule::Fixed(Operation::GetProducts),
            Alias::GetGoals => IntentRule::Fixed(Operation::GetGoals),
            Alias::PutGoal => IntentRule::Fixed(Operation::PutGoal),
            Alias::DeleteGoal => IntentRule::Fixed(Operation::DeleteGoal),
            Alias::ManageGoals => IntentRule::GoalIntent,
        }
    }

    pub fn by_function_id(key: &str) -> Option<Alias> {
        let key = key.trim();
        Alias::ALL
            .into_iter()
            .find(|a| a.function_id().eq_ignore_ascii_case(key))
    }

    pub fn by_title(key: &str) -> Option<Alias> {
        let key = key.trim();
        Alias::ALL
            .into_iter()
            .find(|a| a.titles().iter().any(|t| t.eq_ignore_ascii_case(key)))
    }

    /// Look up by function id first, then by title.
    pub fn lookup(function_id: &str, title: &str) -> Option<Alias> {
        Alias::by_function_id(function_id).or_else(|| {
            if title.trim().is_empty() {
                None
            } else {
                Alias::by_title(title)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn function_ids_and_titles_are_unique() {
        let mut names: Vec<String> = Vec::new();
        for alias in Alias::ALL {
            names.push(alias.function_id().to_ascii_lowercase());
            names.extend(alias.titles().iter().map(|t| t.to_ascii_lowercase()));
        }
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn every_alias_resolves_by_its_own_id() {
        for alias in Alias::ALL {
            assert_eq!(Alias::by_function_id(alias.function_id()), Some(alias));
            for title in alias.titles() {
                assert_eq!(Alias::by_title(title), Some(alias));
            }
        }
    }

    #[test]
    fn lookup_is_case_insensitive_but_exact() {
        assert_eq!(Alias::by_function_id(" GET_GOALS "), Some(Alias::GetGoals));
        assert_eq!(
            Alias::by_title("manage financial goals"),
            Some(Alias::ManageGoals)
        );
        assert_eq!(Alias::by_function_id("get_goal"), None);
        assert_eq!(Alias::by_title("Manage Goals"), None);
    }

    #[test]
    fn title_is_the_fallback_key() {
        assert_eq!(
            Alias::lookup("goals_v2", "Manage Financial Goals"),
            Some(Alias::ManageGoals)
        );
        assert_eq!(Alias::lookup("goals_v2", ""), None);
    }

    #[test]
    fn goal_intent_reads_parameters() {
        let rule = IntentRule::GoalIntent;
        assert_eq!(rule.operation_for(&Map::new()), Operation::GetGoals);
        assert_eq!(
            rule.operation_for(&params(json!({"goal": {"name": "Car"}}))),
            Operation::PutGoal
        );
        assert_eq!(
            rule.operation_for(&params(json!({"goal_id": "g1"}))),
            Operation::DeleteGoal
        );
        assert_eq!(
            rule.operation_for(&params(json!({"action": "get", "goal_id": "g1"}))),
            Operation::GetGoals
        );
        assert_eq!(
            rule.operation_for(&params(json!({"action": "archive"}))),
            Operation::GetGoals
        );
    }

    #[test]
    fn goal_actions_match_their_defaults() {
        for op in [Operation::GetGoals, Operation::PutGoal, Operation::DeleteGoal] {
            let action = op.goal_action().unwrap();
            assert_eq!(op.defaults(), &[("action", action)]);
            assert_eq!(Operation::from_goal_action(&action.to_ascii_uppercase()), Some(op));
        }
        assert_eq!(Operation::GetProducts.goal_action(), None);
    }

    #[test]
    fn goal_operations_share_a_domain() {
        for op in [Operation::GetGoals, Operation::PutGoal, Operation::DeleteGoal] {
            assert_eq!(op.domain(), Domain::Goals);
        }
        assert!(Operation::PutGoal.is_write());
        assert!(!Operation::GetGoals.is_write());
    }

    #[test]
    fn candidates_cover_every_pick() {
        for alias in Alias::ALL {
            let rule = alias.rule();
            for p in [json!({}), json!({"goal": {}}), json!({"goal_id": "g1"}), json!({"action": "put"})] {
                assert!(rule.candidates().contains(&rule.operation_for(&params(p))));
            }
        }
    }
}
