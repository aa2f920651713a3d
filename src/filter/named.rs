//! Named state filters.

use std::fmt;

use crate::resource::{
    ChangeMask, ConflictAction, ConflictOperation, ConflictReason, LocalResourceState,
    ResourceHandle, Status, TreeConflict,
};

use super::StateFilter;

/// The catalogue of named state filters.
///
/// Every filter except [`Filter::InternalInvalid`] rejects resources whose
/// status is [`Status::InternalInvalid`] and refuses to recurse into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    All,
    InternalInvalid,
    NotExists,
    Ignored,
    IgnoredNotForbidden,
    Unversioned,
    Versioned,
    OnRepository,
    NotOnRepository,
    New,
    Added,
    NotModified,
    Modified,
    Conflicting,
    ContentConflicting,
    PropertiesConflicting,
    DataConflicting,
    TreeConflicting,
    /// Tree-conflicted, and the conflict implies the node exists in the repository.
    TreeConflictingRepositoryExist,
    Deleted,
    Missing,
    Obstructed,
    Replaced,
    Prereplaced,
    PrereplacedReplaced,
    Commitable,
    Revertable,
    AnyChange,
    ExcludeDeleted,
    ExcludePrereplacedAndDeleted,
    Switched,
    Locked,
    ReadyToLock,
    Linked,
    UnversionedExternal,
    VersionedFiles,
    VersionedFolders,
    HasPropertyChanges,
}

fn is_any(state: &LocalResourceState, statuses: &[Status]) -> bool {
    statuses.contains(&state.status)
}

/// Whether a tree conflict implies the node still exists in the repository.
fn conflict_exists_on_repository(conflict: &TreeConflict) -> bool {
    match conflict.operation {
        ConflictOperation::Update | ConflictOperation::Switch => {
            conflict.action != ConflictAction::Delete
                && !(conflict.action == ConflictAction::Add
                    && conflict.reason == ConflictReason::Added)
        }
        ConflictOperation::Merge => {
            conflict.action != ConflictAction::Delete && conflict.reason == ConflictReason::Modified
        }
        ConflictOperation::None => false,
    }
}

impl Filter {
    /// Every named filter, in declaration order.
    pub const CATALOGUE: [Filter; 38] = [
        Filter::All,
        Filter::InternalInvalid,
        Filter::NotExists,
        Filter::Ignored,
        Filter::IgnoredNotForbidden,
        Filter::Unversioned,
        Filter::Versioned,
        Filter::OnRepository,
        Filter::NotOnRepository,
        Filter::New,
        Filter::Added,
        Filter::NotModified,
        Filter::Modified,
        Filter::Conflicting,
        Filter::ContentConflicting,
        Filter::PropertiesConflicting,
        Filter::DataConflicting,
        Filter::TreeConflicting,
        Filter::TreeConflictingRepositoryExist,
        Filter::Deleted,
        Filter::Missing,
        Filter::Obstructed,
        Filter::Replaced,
        Filter::Prereplaced,
        Filter::PrereplacedReplaced,
        Filter::Commitable,
        Filter::Revertable,
        Filter::AnyChange,
        Filter::ExcludeDeleted,
        Filter::ExcludePrereplacedAndDeleted,
        Filter::Switched,
        Filter::Locked,
        Filter::ReadyToLock,
        Filter::Linked,
        Filter::UnversionedExternal,
        Filter::VersionedFiles,
        Filter::VersionedFolders,
        Filter::HasPropertyChanges,
    ];

    /// Look a filter up by its [`name`](Filter::name).
    pub fn from_name(name: &str) -> Option<Filter> {
        Filter::CATALOGUE.into_iter().find(|f| f.name() == name)
    }

    /// Stable name of the filter, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::InternalInvalid => "internal-invalid",
            Filter::NotExists => "not-exists",
            Filter::Ignored => "ignored",
            Filter::IgnoredNotForbidden => "ignored-not-forbidden",
            Filter::Unversioned => "unversioned",
            Filter::Versioned => "versioned",
            Filter::OnRepository => "on-repository",
            Filter::NotOnRepository => "not-on-repository",
            Filter::New => "new",
            Filter::Added => "added",
            Filter::NotModified => "not-modified",
            Filter::Modified => "modified",
            Filter::Conflicting => "conflicting",
            Filter::ContentConflicting => "content-conflicting",
            Filter::PropertiesConflicting => "properties-conflicting",
            Filter::DataConflicting => "data-conflicting",
            Filter::TreeConflicting => "tree-conflicting",
            Filter::TreeConflictingRepositoryExist => "tree-conflicting-repository-exist",
            Filter::Deleted => "deleted",
            Filter::Missing => "missing",
            Filter::Obstructed => "obstructed",
            Filter::Replaced => "replaced",
            Filter::Prereplaced => "prereplaced",
            Filter::PrereplacedReplaced => "prereplaced-replaced",
            Filter::Commitable => "commitable",
            Filter::Revertable => "revertable",
            Filter::AnyChange => "any-change",
            Filter::ExcludeDeleted => "exclude-deleted",
            Filter::ExcludePrereplacedAndDeleted => "exclude-prereplaced-and-deleted",
            Filter::Switched => "switched",
            Filter::Locked => "locked",
            Filter::ReadyToLock => "ready-to-lock",
            Filter::Linked => "linked",
            Filter::UnversionedExternal => "unversioned-external",
            Filter::VersionedFiles => "versioned-files",
            Filter::VersionedFolders => "versioned-folders",
            Filter::HasPropertyChanges => "has-property-changes",
        }
    }

    fn accept_impl(self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        use Status::*;

        match self {
            Filter::All => true,
            Filter::InternalInvalid => state.status == InternalInvalid,
            Filter::NotExists => is_any(state, &[NotExists, Linked]),
            Filter::Ignored => state.status == Ignored,
            Filter::IgnoredNotForbidden => {
                state.status == Ignored && !state.mask.contains(ChangeMask::FORBIDDEN)
            }
            Filter::Unversioned => is_any(state, &[Prereplaced, New, Ignored, NotExists]),
            Filter::Versioned => match &state.tree_conflict {
                Some(conflict) => {
                    conflict_exists_on_repository(conflict)
                        || conflict.reason == ConflictReason::Added
                }
                None => is_any(
                    state,
                    &[
                        Replaced,
                        Prereplaced,
                        Added,
                        Normal,
                        Modified,
                        Conflicting,
                        Deleted,
                        Missing,
                    ],
                ),
            },
            Filter::OnRepository => match &state.tree_conflict {
                Some(conflict) => conflict_exists_on_repository(conflict),
                None => is_any(
                    state,
                    &[
                        Prereplaced,
                        Replaced,
                        Normal,
                        Modified,
                        Conflicting,
                        Deleted,
                        Missing,
                    ],
                ),
            },
            Filter::NotOnRepository => match &state.tree_conflict {
                Some(conflict) => !conflict_exists_on_repository(conflict),
                None => is_any(state, &[Prereplaced, New, Ignored, NotExists, Added]),
            },
            Filter::New => {
                is_any(state, &[Prereplaced, New]) && !Filter::Ignored.accept(resource, state)
            }
            Filter::Added => is_any(state, &[Prereplaced, Replaced, New, Added]),
            Filter::NotModified => is_any(state, &[Normal, NotExists, Linked]),
            Filter::Modified => is_any(state, &[Modified, Conflicting]),
            Filter::Conflicting => state.status == Conflicting,
            Filter::ContentConflicting => state.text_status == Conflicting,
            Filter::PropertiesConflicting => state.property_status == Conflicting,
            Filter::DataConflicting => state.status == Conflicting && !state.has_tree_conflict(),
            Filter::TreeConflicting => state.has_tree_conflict(),
            Filter::TreeConflictingRepositoryExist => state
                .tree_conflict
                .as_ref()
                .is_some_and(conflict_exists_on_repository),
            Filter::Deleted => is_any(state, &[Prereplaced, Replaced, Deleted, Missing]),
            Filter::Missing => state.status == Missing,
            Filter::Obstructed => state.status == Obstructed,
            Filter::Replaced => state.status == Replaced,
            Filter::Prereplaced => state.status == Prereplaced,
            Filter::PrereplacedReplaced => is_any(state, &[Prereplaced, Replaced]),
            Filter::Commitable => is_any(state, &[Replaced, Added, Modified, Deleted, Missing]),
            Filter::Revertable => {
                is_any(
                    state,
                    &[
                        Prereplaced,
                        Conflicting,
                        Replaced,
                        Added,
                        Modified,
                        Deleted,
                        Missing,
                    ],
                ) || Filter::TreeConflicting.accept(resource, state)
            }
            Filter::AnyChange => {
                !Filter::Ignored.accept(resource, state)
                    && !is_any(state, &[Normal, Obstructed, Linked])
            }
            Filter::ExcludeDeleted => {
                Filter::OnRepository.accept(resource, state) && !is_any(state, &[Deleted, Missing])
            }
            Filter::ExcludePrereplacedAndDeleted => {
                Filter::Versioned.accept(resource, state)
                    && !Filter::Prereplaced.accept(resource, state)
                    && !is_any(state, &[Deleted, Missing])
            }
            Filter::Switched => state.mask.contains(ChangeMask::SWITCHED),
            Filter::Locked => state.mask.contains(ChangeMask::LOCKED),
            Filter::ReadyToLock => {
                resource.is_file()
                    && !state.mask.contains(ChangeMask::LOCKED)
                    && Filter::ExcludeDeleted.accept(resource, state)
            }
            Filter::Linked => state.status == Linked,
            Filter::UnversionedExternal => {
                state.status == Ignored && state.mask.contains(ChangeMask::SVN_EXTERNALS)
            }
            Filter::VersionedFiles => {
                resource.is_file() && Filter::Versioned.accept(resource, state)
            }
            Filter::VersionedFolders => {
                resource.is_container() && Filter::Versioned.accept(resource, state)
            }
            Filter::HasPropertyChanges => {
                matches!(state.property_status, Modified | Conflicting)
            }
        }
    }

    fn recursion_impl(self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        let external = || Filter::UnversionedExternal.accept(resource, state);
        let versioned_or_external = || Filter::Versioned.accept(resource, state) || external();
        let on_repository_or_external = || Filter::OnRepository.accept(resource, state) || external();
        let exclude_deleted_or_external =
            || Filter::ExcludeDeleted.accept(resource, state) || external();

        match self {
            Filter::All
            | Filter::NotExists
            | Filter::Ignored
            | Filter::IgnoredNotForbidden
            | Filter::Unversioned
            | Filter::NotOnRepository
            | Filter::NotModified
            | Filter::Obstructed
            | Filter::Switched
            | Filter::Linked => true,
            Filter::InternalInvalid => false,
            Filter::Versioned
            | Filter::OnRepository
            | Filter::Added
            | Filter::Replaced
            | Filter::Prereplaced
            | Filter::PrereplacedReplaced
            | Filter::Commitable
            | Filter::Revertable
            | Filter::VersionedFiles
            | Filter::VersionedFolders => versioned_or_external(),
            Filter::Modified
            | Filter::Conflicting
            | Filter::ContentConflicting
            | Filter::PropertiesConflicting
            | Filter::DataConflicting
            | Filter::TreeConflicting
            | Filter::Deleted
            | Filter::Missing
            | Filter::Locked
            | Filter::HasPropertyChanges => on_repository_or_external(),
            Filter::TreeConflictingRepositoryExist => Filter::OnRepository.accept(resource, state),
            Filter::UnversionedExternal => Filter::Versioned.accept(resource, state),
            Filter::New | Filter::AnyChange => {
                (!Filter::Ignored.accept(resource, state)
                    || state.mask.contains(ChangeMask::SVN_EXTERNALS))
                    && !matches!(state.status, Status::Obstructed | Status::Linked)
            }
            Filter::ExcludeDeleted
            | Filter::ExcludePrereplacedAndDeleted
            | Filter::ReadyToLock => exclude_deleted_or_external(),
        }
    }
}

impl StateFilter for Filter {
    fn accept(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        match self {
            Filter::InternalInvalid => state.status == Status::InternalInvalid,
            _ => state.status != Status::InternalInvalid && self.accept_impl(resource, state),
        }
    }

    fn allows_recursion(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        state.status != Status::InternalInvalid && self.recursion_impl(resource, state)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLED: [Status; 8] = [
        Status::Added,
        Status::Deleted,
        Status::Missing,
        Status::Modified,
        Status::New,
        Status::Ignored,
        Status::Normal,
        Status::NotExists,
    ];

    fn check(filter: Filter, expected: [bool; 8]) {
        let resource = ResourceHandle::file("/wc/file.txt");
        for (status, want) in SAMPLED.iter().zip(expected) {
            let state = LocalResourceState::new(*status);
            assert_eq!(
                filter.accept(&resource, &state),
                want,
                "{} on {}",
                filter,
                status
            );
        }
    }

    #[test]
    fn status_matrix() {
        let t = true;
        let f = false;
        check(Filter::Added, [t, f, f, f, t, f, f, f]);
        check(Filter::All, [t, t, t, t, t, t, t, t]);
        check(Filter::AnyChange, [t, t, t, t, t, f, f, t]);
        check(Filter::Commitable, [t, t, t, t, f, f, f, f]);
        check(Filter::Deleted, [f, t, t, f, f, f, f, f]);
        check(Filter::Ignored, [f, f, f, f, f, t, f, f]);
        check(Filter::Modified, [f, f, f, t, f, f, f, f]);
        check(Filter::New, [f, f, f, f, t, f, f, f]);
        check(Filter::Unversioned, [f, f, f, f, t, t, f, t]);
        check(Filter::NotExists, [f, f, f, f, f, f, f, t]);
        check(Filter::NotModified, [f, f, f, f, f, f, t, t]);
        check(Filter::OnRepository, [f, t, t, t, f, f, t, f]);
        check(Filter::Versioned, [t, t, t, t, f, f, t, f]);
    }

    #[test]
    fn internal_invalid_is_rejected_everywhere_else() {
        let resource = ResourceHandle::file("/wc/file.txt");
        let state = LocalResourceState::new(Status::InternalInvalid);

        assert!(Filter::InternalInvalid.accept(&resource, &state));
        assert!(!Filter::InternalInvalid.allows_recursion(&resource, &state));
        assert!(!Filter::All.accept(&resource, &state));
        assert!(!Filter::All.allows_recursion(&resource, &state));
    }

    #[test]
    fn update_conflict_with_incoming_delete_is_not_on_repository() {
        let resource = ResourceHandle::file("/wc/file.txt");
        let state = LocalResourceState::new(Status::Conflicting).with_tree_conflict(
            TreeConflict::new(
                ConflictOperation::Update,
                ConflictAction::Delete,
                ConflictReason::Modified,
            ),
        );

        assert!(Filter::TreeConflicting.accept(&resource, &state));
        assert!(!Filter::TreeConflictingRepositoryExist.accept(&resource, &state));
        assert!(!Filter::OnRepository.accept(&resource, &state));
        assert!(Filter::NotOnRepository.accept(&resource, &state));
        assert!(!Filter::Versioned.accept(&resource, &state));
        assert!(!Filter::DataConflicting.accept(&resource, &state));
    }

    #[test]
    fn update_conflict_add_on_add_is_versioned_only() {
        let resource = ResourceHandle::file("/wc/file.txt");
        let state = LocalResourceState::new(Status::Added).with_tree_conflict(TreeConflict::new(
            ConflictOperation::Update,
            ConflictAction::Add,
            ConflictReason::Added,
        ));

        assert!(!Filter::OnRepository.accept(&resource, &state));
        assert!(Filter::Versioned.accept(&resource, &state));
    }

    #[test]
    fn merge_conflict_exists_only_when_locally_modified() {
        let resource = ResourceHandle::file("/wc/file.txt");
        let modified = LocalResourceState::new(Status::Conflicting).with_tree_conflict(
            TreeConflict::new(
                ConflictOperation::Merge,
                ConflictAction::Modify,
                ConflictReason::Modified,
            ),
        );
        let deleted = LocalResourceState::new(Status::Conflicting).with_tree_conflict(
            TreeConflict::new(
                ConflictOperation::Merge,
                ConflictAction::Modify,
                ConflictReason::Deleted,
            ),
        );

        assert!(Filter::TreeConflictingRepositoryExist.accept(&resource, &modified));
        assert!(!Filter::TreeConflictingRepositoryExist.accept(&resource, &deleted));
        assert!(Filter::Revertable.accept(&resource, &deleted));
    }

    #[test]
    fn kind_specific_filters() {
        let file = ResourceHandle::file("/wc/a.txt");
        let dir = ResourceHandle::container("/wc/src");
        let normal = LocalResourceState::new(Status::Normal);

        assert!(Filter::VersionedFiles.accept(&file, &normal));
        assert!(!Filter::VersionedFiles.accept(&dir, &normal));
        assert!(Filter::VersionedFolders.accept(&dir, &normal));
        assert!(Filter::ReadyToLock.accept(&file, &normal));
        assert!(!Filter::ReadyToLock.accept(&file, &normal.clone().with_mask(ChangeMask::LOCKED)));
    }

    #[test]
    fn property_status_filters() {
        let file = ResourceHandle::file("/wc/a.txt");
        let state = LocalResourceState::new(Status::Normal).with_property_status(Status::Modified);

        assert!(Filter::HasPropertyChanges.accept(&file, &state));
        assert!(!Filter::PropertiesConflicting.accept(&file, &state));
        assert!(!Filter::ContentConflicting.accept(&file, &state));
    }

    #[test]
    fn externals_allow_recursion_into_ignored_nodes() {
        let dir = ResourceHandle::container("/wc/ext");
        let external = LocalResourceState::new(Status::Ignored).with_mask(ChangeMask::SVN_EXTERNALS);
        let ignored = LocalResourceState::new(Status::Ignored);

        assert!(Filter::UnversionedExternal.accept(&dir, &external));
        assert!(Filter::Modified.allows_recursion(&dir, &external));
        assert!(!Filter::Modified.allows_recursion(&dir, &ignored));
        assert!(Filter::AnyChange.allows_recursion(&dir, &external));
        assert!(!Filter::AnyChange.allows_recursion(&dir, &ignored));
    }

    #[test]
    fn deleted_nodes_still_allow_recursion_for_deleted_filter() {
        let dir = ResourceHandle::container("/wc/gone");
        let state = LocalResourceState::new(Status::Deleted);

        assert!(Filter::Deleted.allows_recursion(&dir, &state));
        assert!(!Filter::ExcludeDeleted.allows_recursion(&dir, &state));
    }
}
