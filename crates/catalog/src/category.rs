use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use shopfloor_core::{
    CategoryId, DomainError, DomainResult, Entity, OrganizationId, Status, require_text,
};

/// Product category. Top-level categories have level 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub status: Status,
    pub parent_id: Option<CategoryId>,
    pub level: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    /// Absent keeps the parent, `null` detaches to the top level.
    #[serde(default, deserialize_with = "present_or_null")]
    pub parent_id: Option<Option<CategoryId>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Category {
    pub fn create(
        organization_id: OrganizationId,
        draft: CategoryDraft,
        parent: Option<&Category>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        require_text("name", &draft.name, 100)?;
        let level = level_under(organization_id, draft.parent_id, parent)?;
        Ok(Self {
            id: CategoryId::new(),
            organization_id,
            name: draft.name.trim().to_string(),
            status: draft.status,
            parent_id: draft.parent_id,
            level,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply name/status/parent changes.
    ///
    /// `all` is every category of the organization; it is used to reject moves
    /// under one of this category's own descendants.
    pub fn update(
        &mut self,
        name: String,
        status: Status,
        parent_id: Option<CategoryId>,
        all: &[Category],
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        require_text("name", &name, 100)?;
        let parent = parent_id.and_then(|id| all.iter().find(|c| c.id == id));
        if let Some(pid) = parent_id {
            if pid == self.id || ancestry(all, pid).contains(&self.id) {
                return Err(DomainError::invariant("a category cannot be its own ancestor"));
            }
        }
        self.level = level_under(self.organization_id, parent_id, parent)?;
        self.name = name.trim().to_string();
        self.status = status;
        self.parent_id = parent_id;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

fn level_under(
    organization_id: OrganizationId,
    parent_id: Option<CategoryId>,
    parent: Option<&Category>,
) -> DomainResult<u32> {
    match (parent_id, parent) {
        (None, _) => Ok(1),
        (Some(_), Some(p)) if p.organization_id == organization_id => Ok(p.level + 1),
        (Some(_), _) => Err(DomainError::invariant(
            "parent category does not belong to the organization",
        )),
    }
}

/// Ids of the ancestors of `start`, nearest first. Stops on cycles.
pub fn ancestry(all: &[Category], start: CategoryId) -> Vec<CategoryId> {
    let by_id: HashMap<CategoryId, &Category> = all.iter().map(|c| (c.id, c)).collect();
    let mut seen = HashSet::new();
    let mut chain = Vec::new();
    let mut cursor = by_id.get(&start).and_then(|c| c.parent_id);
    while let Some(id) = cursor {
        if !seen.insert(id) {
            break;
        }
        chain.push(id);
        cursor = by_id.get(&id).and_then(|c| c.parent_id);
    }
    chain
}

/// Descendants of `root` whose level no longer matches their depth below it,
/// with corrected levels. `root` must already carry its new level.
pub fn relevel_descendants(root: &Category, all: &[Category], now: DateTime<Utc>) -> Vec<Category> {
    let mut changed = Vec::new();
    let mut queue = VecDeque::from([(root.id, root.level)]);
    let mut visited = HashSet::from([root.id]);

    while let Some((parent_id, parent_level)) = queue.pop_front() {
        for child in all.iter().filter(|c| c.parent_id == Some(parent_id)) {
            if !visited.insert(child.id) {
                continue;
            }
            let level = parent_level + 1;
            if child.level != level {
                let mut updated = child.clone();
                updated.level = level;
                updated.updated_at = now;
                changed.push(updated);
            }
            queue.push_back((child.id, level));
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> OrganizationId {
        OrganizationId::new()
    }

    fn draft(name: &str, parent_id: Option<CategoryId>) -> CategoryDraft {
        CategoryDraft {
            name: name.to_string(),
            status: Status::Active,
            parent_id,
        }
    }

    #[test]
    fn root_category_has_level_one() {
        let c = Category::create(org(), draft("Herramientas", None), None, Utc::now()).unwrap();
        assert_eq!(c.level, 1);
    }

    #[test]
    fn child_level_is_parent_plus_one() {
        let org = org();
        let root = Category::create(org, draft("Herramientas", None), None, Utc::now()).unwrap();
        let child =
            Category::create(org, draft("Manuales", Some(root.id)), Some(&root), Utc::now()).unwrap();
        assert_eq!(child.level, 2);
        assert_eq!(child.parent_id, Some(root.id));
    }

    #[test]
    fn foreign_or_missing_parent_is_rejected() {
        let other = Category::create(org(), draft("Ajena", None), None, Utc::now()).unwrap();
        let err = Category::create(org(), draft("X", Some(other.id)), Some(&other), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let err = Category::create(org(), draft("X", Some(CategoryId::new())), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn moving_under_own_descendant_is_rejected() {
        let org = org();
        let a = Category::create(org, draft("A", None), None, Utc::now()).unwrap();
        let b = Category::create(org, draft("B", Some(a.id)), Some(&a), Utc::now()).unwrap();
        let c = Category::create(org, draft("C", Some(b.id)), Some(&b), Utc::now()).unwrap();
        let all = vec![a.clone(), b.clone(), c.clone()];

        let mut moved = a.clone();
        let err = moved
            .update("A".to_string(), Status::Active, Some(c.id), &all, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(moved, a);
    }

    #[test]
    fn relevel_follows_the_whole_subtree() {
        let org = org();
        let a = Category::create(org, draft("A", None), None, Utc::now()).unwrap();
        let x = Category::create(org, draft("X", None), None, Utc::now()).unwrap();
        let b = Category::create(org, draft("B", Some(x.id)), Some(&x), Utc::now()).unwrap();
        let c = Category::create(org, draft("C", Some(b.id)), Some(&b), Utc::now()).unwrap();
        let all = vec![a.clone(), x.clone(), b.clone(), c.clone()];

        // Move X under A: X becomes level 2, B level 3, C level 4.
        let mut moved = x.clone();
        moved
            .update("X".to_string(), Status::Active, Some(a.id), &all, Utc::now())
            .unwrap();
        assert_eq!(moved.level, 2);

        let changed = relevel_descendants(&moved, &all, Utc::now());
        let levels: HashMap<CategoryId, u32> = changed.iter().map(|c| (c.id, c.level)).collect();
        assert_eq!(levels.get(&b.id), Some(&3));
        assert_eq!(levels.get(&c.id), Some(&4));
    }

    #[test]
    fn patch_distinguishes_null_from_absent_parent() {
        let absent: CategoryPatch = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert_eq!(absent.parent_id, None);

        let detach: CategoryPatch = serde_json::from_str(r#"{"parent_id":null}"#).unwrap();
        assert_eq!(detach.parent_id, Some(None));
    }
}
