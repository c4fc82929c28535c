//! Hierarchical goal network.
//!
//! Goals live in an arena keyed by id. Each entry records its parent and the
//! ordered ids of its children, so lookups and updates never walk the tree.
//! Children are only ever attached at creation, which keeps the structure
//! acyclic without further checks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CanvasError, Result};

pub const ROOT_ID: &str = "root";
pub const ROOT_TITLE: &str = "Recipe Business Goals";
pub const NEW_GOAL_TITLE: &str = "New Goal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    /// Suggested top-level goals offered for this category.
    pub templates: &'static [&'static str],
}

pub static CATEGORIES: [Category; 4] = [
    Category {
        name: "Content Creation",
        color: "#BFDBFE",
        description: "Recipe development, photos, videos",
        templates: &[
            "Develop 10 signature recipes",
            "Create weekly content calendar",
            "Establish photo/video style guide",
            "Build recipe template system",
        ],
    },
    Category {
        name: "Community Growth",
        color: "#BBF7D0",
        description: "Social media, engagement, followers",
        templates: &[
            "Reach 10k Instagram followers",
            "Launch weekly newsletter",
            "Start Facebook community group",
            "Engage with 50 accounts daily",
        ],
    },
    Category {
        name: "Product Development",
        color: "#FBCFE8",
        description: "Food products, merchandise",
        templates: &[
            "Launch first cookbook",
            "Create meal plan subscription",
            "Design merchandise line",
            "Develop spice blend products",
        ],
    },
    Category {
        name: "Revenue Streams",
        color: "#FDE68A",
        description: "Monetization, sales, sponsorships",
        templates: &[
            "Set up affiliate partnerships",
            "Launch Patreon membership",
            "Secure brand sponsorships",
            "Start online cooking classes",
        ],
    },
];

pub fn category_for_color(color: &str) -> Option<&'static Category> {
    CATEGORIES
        .iter()
        .find(|category| category.color.eq_ignore_ascii_case(color))
}

pub fn category_named(name: &str) -> Option<&'static Category> {
    CATEGORIES
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalEntry {
    pub id: String,
    pub title: String,
    pub color: String,
    pub is_complete: bool,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

impl GoalEntry {
    fn new(id: String, title: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            id,
            title: title.into(),
            color: CATEGORIES[0].color.to_string(),
            is_complete: false,
            parent,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Nested exchange format, one record per goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub id: String,
    pub title: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub children: Vec<GoalRecord>,
}

fn default_color() -> String {
    CATEGORIES[0].color.to_string()
}

/// What a double-click on a goal does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalActivation {
    /// Leaf goals flip their completion.
    Toggled { complete: bool },
    /// Goals with children open their title for editing instead.
    EditTitle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalTree {
    root: String,
    goals: HashMap<String, GoalEntry>,
}

impl Default for GoalTree {
    fn default() -> Self {
        Self::new(ROOT_ID, ROOT_TITLE)
    }
}

impl GoalTree {
    pub fn new(root_id: impl Into<String>, title: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let mut goals = HashMap::new();
        goals.insert(root_id.clone(), GoalEntry::new(root_id.clone(), title, None));
        Self {
            root: root_id,
            goals,
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> &GoalEntry {
        &self.goals[&self.root]
    }

    pub fn get(&self, id: &str) -> Option<&GoalEntry> {
        self.goals.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.goals.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn children(&self, id: &str) -> impl Iterator<Item = &GoalEntry> + '_ {
        self.goals
            .get(id)
            .map(|goal| goal.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.goals.get(child))
    }

    /// Goals in pre-order together with their depth below the root.
    pub fn depth_first(&self) -> Vec<(usize, &GoalEntry)> {
        let mut out = Vec::with_capacity(self.goals.len());
        let mut stack = vec![(0, self.root.as_str())];
        while let Some((depth, id)) = stack.pop() {
            let Some(goal) = self.goals.get(id) else {
                continue;
            };
            out.push((depth, goal));
            for child in goal.children.iter().rev() {
                stack.push((depth + 1, child.as_str()));
            }
        }
        out
    }

    pub fn add_child(&mut self, parent_id: &str) -> Option<String> {
        if !self.contains(parent_id) {
            return None;
        }
        let id = new_goal_id();
        self.goals.insert(
            id.clone(),
            GoalEntry::new(id.clone(), NEW_GOAL_TITLE, Some(parent_id.to_string())),
        );
        if let Some(parent) = self.goals.get_mut(parent_id) {
            parent.children.push(id.clone());
        }
        debug!(parent = parent_id, goal = %id, "added goal");
        Some(id)
    }

    /// Adds `title` under the root, coloured for `category`.
    pub fn add_template_goal(&mut self, category: &Category, title: &str) -> Option<String> {
        let root = self.root.clone();
        let id = self.add_child(&root)?;
        if let Some(goal) = self.goals.get_mut(&id) {
            goal.title = title.to_string();
            goal.color = category.color.to_string();
        }
        Some(id)
    }

    /// Appends a new goal to `sibling_id`'s parent. The root has no siblings.
    pub fn add_sibling(&mut self, sibling_id: &str) -> Option<String> {
        let parent = self.goals.get(sibling_id)?.parent.clone()?;
        self.add_child(&parent)
    }

    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> bool {
        match self.goals.get_mut(id) {
            Some(goal) => {
                goal.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn set_complete(&mut self, id: &str, complete: bool) -> bool {
        match self.goals.get_mut(id) {
            Some(goal) => {
                goal.is_complete = complete;
                true
            }
            None => false,
        }
    }

    pub fn toggle_complete(&mut self, id: &str) -> Option<bool> {
        let goal = self.goals.get_mut(id)?;
        goal.is_complete = !goal.is_complete;
        Some(goal.is_complete)
    }

    pub fn activate(&mut self, id: &str) -> Option<GoalActivation> {
        if self.goals.get(id)?.is_leaf() {
            let complete = self.toggle_complete(id)?;
            Some(GoalActivation::Toggled { complete })
        } else {
            Some(GoalActivation::EditTitle)
        }
    }

    /// Moves the goal to the next category colour, wrapping around. Colours
    /// outside the palette restart at the first category.
    pub fn cycle_category(&mut self, id: &str) -> Option<&'static Category> {
        let goal = self.goals.get_mut(id)?;
        let next = match CATEGORIES
            .iter()
            .position(|category| category.color.eq_ignore_ascii_case(&goal.color))
        {
            Some(index) => &CATEGORIES[(index + 1) % CATEGORIES.len()],
            None => &CATEGORIES[0],
        };
        goal.color = next.color.to_string();
        Some(next)
    }

    /// Removes a goal with its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.goals.get(id).and_then(|goal| goal.parent.clone()) else {
            return false;
        };
        if let Some(parent) = self.goals.get_mut(&parent) {
            parent.children.retain(|child| child != id);
        }

        let mut pending = vec![id.to_string()];
        let mut removed = 0usize;
        while let Some(next) = pending.pop() {
            if let Some(goal) = self.goals.remove(&next) {
                pending.extend(goal.children);
                removed += 1;
            }
        }
        debug!(goal = id, removed, "removed goal subtree");
        true
    }

    /// Completion percentage: leaves are 0 or 100, parents the rounded mean of
    /// their children.
    pub fn progress(&self, id: &str) -> Option<u32> {
        let goal = self.goals.get(id)?;
        if goal.is_leaf() {
            return Some(if goal.is_complete { 100 } else { 0 });
        }
        let total: u32 = goal
            .children
            .iter()
            .filter_map(|child| self.progress(child))
            .sum();
        Some((total as f64 / goal.children.len() as f64).round() as u32)
    }

    pub fn from_record(record: GoalRecord) -> Result<Self> {
        let mut tree = Self {
            root: record.id.clone(),
            goals: HashMap::new(),
        };
        tree.insert_record(record, None)?;
        Ok(tree)
    }

    pub fn to_record(&self) -> GoalRecord {
        self.record_for(&self.root)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record: GoalRecord = serde_json::from_str(json)?;
        Self::from_record(record)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    fn insert_record(&mut self, record: GoalRecord, parent: Option<String>) -> Result<()> {
        if record.id.trim().is_empty() {
            return Err(CanvasError::malformed("goal with an empty id"));
        }
        if self.goals.contains_key(&record.id) {
            return Err(CanvasError::malformed(format!(
                "duplicate goal id `{}`",
                record.id
            )));
        }
        let id = record.id;
        self.goals.insert(
            id.clone(),
            GoalEntry {
                id: id.clone(),
                title: record.title,
                color: record.color,
                is_complete: record.is_complete,
                parent,
                children: record.children.iter().map(|child| child.id.clone()).collect(),
            },
        );
        for child in record.children {
            self.insert_record(child, Some(id.clone()))?;
        }
        Ok(())
    }

    fn record_for(&self, id: &str) -> GoalRecord {
        let goal = &self.goals[id];
        GoalRecord {
            id: goal.id.clone(),
            title: goal.title.clone(),
            color: goal.color.clone(),
            is_complete: goal.is_complete,
            children: goal
                .children
                .iter()
                .filter(|child| self.goals.contains_key(*child))
                .map(|child| self.record_for(child))
                .collect(),
        }
    }
}

fn new_goal_id() -> String {
    format!("goal-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GoalTree {
        GoalTree::from_json(
            r##"{
                "id": "root",
                "title": "Recipe Business Goals",
                "color": "#BFDBFE",
                "children": [
                    { "id": "content", "title": "Content", "color": "#BFDBFE", "children": [
                        { "id": "videos", "title": "Videos", "color": "#BFDBFE", "isComplete": true },
                        { "id": "photos", "title": "Photos", "color": "#BFDBFE" },
                        { "id": "blog", "title": "Blog", "color": "#BFDBFE", "isComplete": true }
                    ] },
                    { "id": "revenue", "title": "Revenue", "color": "#FDE68A", "isComplete": true }
                ]
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn default_tree_has_single_root() {
        let tree = GoalTree::default();
        assert_eq!(tree.root_id(), "root");
        assert_eq!(tree.root().title, "Recipe Business Goals");
        assert_eq!(tree.root().color, "#BFDBFE");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn progress_is_rounded_mean_of_children() {
        let tree = sample();
        assert_eq!(tree.progress("videos"), Some(100));
        assert_eq!(tree.progress("photos"), Some(0));
        // (100 + 0 + 100) / 3 = 66.67
        assert_eq!(tree.progress("content"), Some(67));
        // (67 + 100) / 2 = 83.5
        assert_eq!(tree.progress("root"), Some(84));
        assert_eq!(tree.progress("ghost"), None);
    }

    #[test]
    fn adding_goals_appends_to_parent() {
        let mut tree = sample();
        let child = tree.add_child("photos").unwrap();
        assert!(child.starts_with("goal-"));
        assert_eq!(tree.get("photos").unwrap().children, vec![child.clone()]);
        assert_eq!(tree.get(&child).unwrap().title, "New Goal");

        let sibling = tree.add_sibling("videos").unwrap();
        assert_eq!(tree.get("content").unwrap().children.last(), Some(&sibling));
        assert_eq!(tree.add_sibling("root"), None);
        assert_eq!(tree.add_child("ghost"), None);
    }

    #[test]
    fn activate_toggles_leaves_and_edits_parents() {
        let mut tree = sample();
        assert_eq!(
            tree.activate("photos"),
            Some(GoalActivation::Toggled { complete: true })
        );
        assert_eq!(tree.progress("content"), Some(100));
        assert_eq!(tree.activate("content"), Some(GoalActivation::EditTitle));
        assert_eq!(tree.activate("ghost"), None);
    }

    #[test]
    fn category_cycles_and_wraps() {
        let mut tree = sample();
        assert_eq!(tree.cycle_category("videos").unwrap().name, "Community Growth");
        assert_eq!(tree.cycle_category("revenue").unwrap().name, "Content Creation");

        tree.goals.get_mut("blog").unwrap().color = "#123456".into();
        assert_eq!(tree.cycle_category("blog").unwrap().color, "#BFDBFE");
    }

    #[test]
    fn template_goals_land_under_root_with_category_colour() {
        let mut tree = sample();
        let growth = category_named("community growth").unwrap();
        assert_eq!(growth.templates.len(), 4);

        let id = tree.add_template_goal(growth, growth.templates[1]).unwrap();
        let goal = tree.get(&id).unwrap();
        assert_eq!(goal.title, "Launch weekly newsletter");
        assert_eq!(goal.color, "#BBF7D0");
        assert_eq!(goal.parent.as_deref(), Some("root"));
        assert_eq!(tree.root().children.last(), Some(&id));
        assert_eq!(category_named("Gardening"), None);
    }

    #[test]
    fn remove_takes_the_subtree() {
        let mut tree = sample();
        assert!(tree.remove("content"));
        assert!(!tree.contains("videos"));
        assert!(!tree.contains("photos"));
        assert_eq!(tree.root().children, vec!["revenue"]);
        assert_eq!(tree.len(), 2);

        assert!(!tree.remove("root"));
        assert!(!tree.remove("content"));
    }

    #[test]
    fn rename_and_completion_updates() {
        let mut tree = sample();
        assert!(tree.rename("photos", "Food photography"));
        assert!(tree.set_complete("photos", true));
        assert_eq!(tree.toggle_complete("photos"), Some(false));
        assert_eq!(tree.get("photos").unwrap().title, "Food photography");
        assert!(!tree.rename("ghost", "x"));
    }

    #[test]
    fn depth_first_lists_in_document_order() {
        let tree = sample();
        let order: Vec<(usize, &str)> = tree
            .depth_first()
            .into_iter()
            .map(|(depth, goal)| (depth, goal.id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, "root"),
                (1, "content"),
                (2, "videos"),
                (2, "photos"),
                (2, "blog"),
                (1, "revenue"),
            ]
        );
    }

    #[test]
    fn json_round_trip_keeps_structure() {
        let tree = sample();
        let json = tree.to_json_pretty().unwrap();
        assert!(json.contains("\"isComplete\": true"));
        assert_eq!(GoalTree::from_json(&json).unwrap(), tree);
    }

    #[test]
    fn duplicate_goal_ids_are_rejected() {
        let err = GoalTree::from_json(
            r#"{ "id": "root", "title": "R", "children": [{ "id": "root", "title": "again" }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CanvasError::MalformedImport(_)));
    }
}
