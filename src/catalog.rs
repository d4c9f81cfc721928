//! Audience scopes, method groups and keyword search over a loaded document.
use clap::ValueEnum;

use crate::document::{ApiDocument, MethodInfo};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Scope {
    #[default]
    All,
    /// apps and browsers
    Client,
    /// authorized backend callers
    Backend,
    Internal,
    Integrated,
}

impl Scope {
    pub fn admits(self, security_level: &str) -> bool {
        let levels: &[&str] = match self {
            Scope::All => return true,
            Scope::Client => &["Anonym", "User", "UnidentifiedUser", "RegisteredDevice"],
            Scope::Backend => &["AuthorizedUser", "InternalUser", "SubSystem"],
            Scope::Internal => &["Internal"],
            Scope::Integrated => &["Integrated"],
        };
        levels.contains(&security_level)
    }
}

/// `user.getProfile` belongs to group `user`; a name without a dot has no group.
pub fn group_name_of(method_name: &str) -> &str {
    method_name.split_once('.').map_or("", |(group, _)| group)
}

#[derive(Clone, Debug)]
pub struct Group<'d> {
    pub group_name: String,
    pub apis: Vec<&'d MethodInfo>,
}

/// Methods of one scope, grouped in first-seen order.
#[derive(Clone, Debug)]
pub struct Catalog<'d> {
    pub scope: Scope,
    pub groups: Vec<Group<'d>>,
}

impl<'d> Catalog<'d> {
    pub fn build(doc: &'d ApiDocument, scope: Scope) -> Self {
        let mut groups: Vec<Group<'d>> = Vec::new();
        for api in doc.apis.iter().filter(|a| scope.admits(&a.security_level)) {
            let group_name = group_name_of(&api.method_name);
            match groups.iter_mut().find(|g| g.group_name == group_name) {
                Some(group) => group.apis.push(api),
                None => groups.push(Group { group_name: group_name.to_owned(), apis: vec![api] }),
            }
        }
        Catalog { scope, groups }
    }

    pub fn apis(&self) -> impl Iterator<Item = &'d MethodInfo> + '_ {
        self.groups.iter().flat_map(|g| g.apis.iter().copied())
    }

    /// Groups holding at least one method that matches `query`. A blank
    /// query matches everything.
    pub fn search(&self, query: &str) -> Vec<Group<'d>> {
        let query = query.trim();
        if query.is_empty() {
            return self.groups.clone();
        }
        self.groups
            .iter()
            .filter_map(|group| {
                let apis: Vec<&'d MethodInfo> =
                    group.apis.iter().copied().filter(|a| a.matches_keyword(query)).collect();
                (!apis.is_empty()).then(|| Group { group_name: group.group_name.clone(), apis })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> ApiDocument {
        let method = |name: &str, level: &str| {
            json!({"methodName": name, "returnType": "string", "securityLevel": level})
        };
        ApiDocument::from_value(json!({
            "apis": [
                method("user.login", "Anonym"),
                method("order.list", "User"),
                method("user.ban", "InternalUser"),
                method("user.profile", "RegisteredDevice"),
                method("ping", "Integrated"),
            ]
        }))
        .unwrap()
    }

    fn names(groups: &[Group]) -> Vec<(String, Vec<String>)> {
        groups
            .iter()
            .map(|g| (g.group_name.clone(), g.apis.iter().map(|a| a.method_name.clone()).collect()))
            .collect()
    }

    #[test]
    fn scopes_admit_their_security_levels() {
        assert!(Scope::All.admits("anything"));
        assert!(Scope::Client.admits("UnidentifiedUser"));
        assert!(!Scope::Client.admits("SubSystem"));
        assert!(Scope::Backend.admits("SubSystem"));
        assert!(Scope::Internal.admits("Internal"));
        assert!(!Scope::Internal.admits("InternalUser"));
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let doc = doc();
        let catalog = Catalog::build(&doc, Scope::Client);
        assert_eq!(
            names(&catalog.groups),
            [
                ("user".to_string(), vec!["user.login".to_string(), "user.profile".to_string()]),
                ("order".to_string(), vec!["order.list".to_string()]),
            ]
        );
        assert_eq!(catalog.apis().count(), 3);

        let all = Catalog::build(&doc, Scope::All);
        assert_eq!(all.groups.last().unwrap().group_name, "");
    }

    #[test]
    fn search_keeps_matching_groups_only() {
        let doc = doc();
        let catalog = Catalog::build(&doc, Scope::All);
        let found = catalog.search(" LOG ");
        assert_eq!(names(&found), [("user".to_string(), vec!["user.login".to_string()])]);
        assert_eq!(catalog.search("   ").len(), catalog.groups.len());
        assert!(catalog.search("nothing-here").is_empty());
    }

    #[test]
    fn group_names_come_from_the_method_prefix() {
        assert_eq!(group_name_of("user.profile.get"), "user");
        assert_eq!(group_name_of("ping"), "");
    }
}
