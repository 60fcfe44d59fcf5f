//! Stable error taxonomy for the pfsc build/index pipeline (spec §7), plus
//! the JSON envelope shape an external HTTP layer would wrap around it
//! (spec §6.3/§6.4).
//!
//! Every variant name is a stable, machine-readable identifier: external
//! layers match on `PfscError::code()`, never on the Display message.

use serde::Serialize;
use thiserror::Error;

/// The full error taxonomy. Grouped to match spec.md §7; `err_lvl` assigns
/// each group a stable numeric band so a client can bucket errors without
/// string-matching every variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PfscError {
    // --- Parser errors (100..200) ---
    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("meson error: missing modal keyword before {0}")]
    MesonMissingModal(String),
    #[error("meson error: excess modal keyword before {0}")]
    MesonExcessModal(String),
    #[error("meson error: excess flow edge at {0}")]
    MesonExcessFlow(String),
    #[error("meson error: excess arrow between {0} and {1}")]
    MesonExcessArrow(String, String),
    #[error("meson error: bad ghost node reference {0}")]
    MesonBadGhostNode(String),
    #[error("meson error: target {0} was not delivered")]
    MesonDidNotDeliver(String),
    #[error("meson error: downward flow edge into {0}")]
    MesonDownwardFlow(String),
    #[error("arc-listing error: {0}")]
    ArclangError(String),

    // --- Semantic errors (200..300) ---
    #[error("module {0} does not contain object {1}")]
    ModuleDoesNotContainObject(String, String),
    #[error("relative libpath cannot be resolved: {0}")]
    RelativeLibpathCannotBeResolved(String),
    #[error("cyclic import detected involving {0}")]
    CyclicImportError(String),
    #[error("target {0} is of wrong type for this operation")]
    TargetOfWrongType(String),
    #[error("cannot clone node {0}")]
    CannotCloneNode(String),
    #[error("malformed cf (comparison) declaration: {0}")]
    MalformedCf(String),
    #[error("malformed quantifier node label: {0}")]
    MalformedQuantifierNodeLabel(String),
    #[error("module name {0} is used with more than one extension in the same directory")]
    DuplicateModuleExtension(String),

    // --- Version / release errors (300..400) ---
    #[error("attempted release build on a sub-repo path")]
    AttemptedReleaseBuildOnSubRepo,
    #[error("attempted to re-index an already-indexed release")]
    AttemptedReleaseReindex,
    #[error("missing required repo change log for major-version increment")]
    MissingRepoChangeLog,
    #[error("numbered releases may not import dependencies at WIP")]
    NoWipImportsInNumberedReleases,
    #[error("build makes a disallowed breaking change: {0}")]
    BuildMakesDisallowedBreakingChange(String),
    #[error("invalid move mapping: {0}")]
    InvalidMoveMapping(String),
    #[error("version not built yet: {0}")]
    VersionNotBuiltYet(String),
    #[error("checked-out commit hash does not match stored hash binding")]
    BadHash,

    // --- Permission / policy errors (400..500) ---
    #[error("inadequate permissions")]
    InadequatePermissions,
    #[error("WIP mode is not available here")]
    NoWipMode,
    #[error("service disabled")]
    ServiceDisabled,
    #[error("shadow version control service disabled")]
    SsnrServiceDisabled,
    #[error("user not logged in")]
    UserNotLoggedIn,
    #[error("action prohibited by user settings")]
    ActionProhibitedByUserSettings,
    #[error("libpath not allowed: {0}")]
    LibpathNotAllowed(String),
    #[error("hosting request rejected")]
    HostingRequestRejected,
    #[error("hosting request unnecessary")]
    HostingRequestUnnecessary,

    // --- Input errors (500..600) ---
    #[error("input empty: {0}")]
    InputEmpty(String),
    #[error("input too long: {0}")]
    InputTooLong(String),
    #[error("input wrong type: {0}")]
    InputWrongType(String),
    #[error("bad libpath: {0}")]
    BadLibpath(String),
    #[error("malformed json: {0}")]
    MalformedJson(String),
    #[error("malformed combiner code: {0}")]
    MalformedCombinerCode(String),
    #[error("malformed doc id: {0}")]
    MalformedDocId(String),
    #[error("malformed versioned libpath: {0}")]
    MalformedVersionedLibpath(String),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("bad alternative args: {0}")]
    BadAlternativeArgs(String),
    #[error("manifest is badly formed: {0}")]
    ManifestBadForm(String),

    // --- Artifact I/O errors (600..700) ---
    #[error("missing manifest for {0}")]
    MissingManifest(String),
    #[error("missing dashgraph for {0}")]
    MissingDashgraph(String),
    #[error("missing annotation for {0}")]
    MissingAnnotation(String),
    #[error("module has no contents: {0}")]
    ModuleHasNoContents(String),
    #[error("repo checkout failed: {0}")]
    RepoCheckoutFailed(String),
    #[error("shadow history merge conflict: {0}")]
    ShadowMergeConflict(String),

    // --- Opaque passthrough for lower-level crate errors ---
    #[error("libpath/version error: {0}")]
    Path(#[from] pfsc_path::PathError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl PfscError {
    /// Stable machine-readable identifier, matching the variant name.
    pub fn code(&self) -> &'static str {
        use PfscError::*;
        match self {
            ParsingError(_) => "PARSING_ERROR",
            MesonMissingModal(_) => "MESON_MISSING_MODAL",
            MesonExcessModal(_) => "MESON_EXCESS_MODAL",
            MesonExcessFlow(_) => "MESON_EXCESS_FLOW",
            MesonExcessArrow(..) => "MESON_EXCESS_ARROW",
            MesonBadGhostNode(_) => "MESON_BAD_GHOST_NODE",
            MesonDidNotDeliver(_) => "MESON_DID_NOT_DELIVER",
            MesonDownwardFlow(_) => "MESON_DOWNWARD_FLOW",
            ArclangError(_) => "ARCLANG_ERROR",
            ModuleDoesNotContainObject(..) => "MODULE_DOES_NOT_CONTAIN_OBJECT",
            RelativeLibpathCannotBeResolved(_) => "RELATIVE_LIBPATH_CANNOT_BE_RESOLVED",
            CyclicImportError(_) => "CYCLIC_IMPORT_ERROR",
            TargetOfWrongType(_) => "TARGET_OF_WRONG_TYPE",
            CannotCloneNode(_) => "CANNOT_CLONE_NODE",
            MalformedCf(_) => "MALFORMED_CF",
            MalformedQuantifierNodeLabel(_) => "MALFORMED_QUANTIFIER_NODE_LABEL",
            DuplicateModuleExtension(_) => "DUPLICATE_MODULE_EXTENSION",
            AttemptedReleaseBuildOnSubRepo => "ATTEMPTED_RELEASE_BUILD_ON_SUB_REPO",
            AttemptedReleaseReindex => "ATTEMPTED_RELEASE_REINDEX",
            MissingRepoChangeLog => "MISSING_REPO_CHANGE_LOG",
            NoWipImportsInNumberedReleases => "NO_WIP_IMPORTS_IN_NUMBERED_RELEASES",
            BuildMakesDisallowedBreakingChange(_) => "BUILD_MAKES_DISALLOWED_BREAKING_CHANGE",
            InvalidMoveMapping(_) => "INVALID_MOVE_MAPPING",
            VersionNotBuiltYet(_) => "VERSION_NOT_BUILT_YET",
            BadHash => "BAD_HASH",
            InadequatePermissions => "INADEQUATE_PERMISSIONS",
            NoWipMode => "NO_WIP_MODE",
            ServiceDisabled => "SERVICE_DISABLED",
            SsnrServiceDisabled => "SSNR_SERVICE_DISABLED",
            UserNotLoggedIn => "USER_NOT_LOGGED_IN",
            ActionProhibitedByUserSettings => "ACTION_PROHIBITED_BY_USER_SETTINGS",
            LibpathNotAllowed(_) => "LIBPATH_NOT_ALLOWED",
            HostingRequestRejected => "HOSTING_REQUEST_REJECTED",
            HostingRequestUnnecessary => "HOSTING_REQUEST_UNNECESSARY",
            InputEmpty(_) => "INPUT_EMPTY",
            InputTooLong(_) => "INPUT_TOO_LONG",
            InputWrongType(_) => "INPUT_WRONG_TYPE",
            BadLibpath(_) => "BAD_LIBPATH",
            MalformedJson(_) => "MALFORMED_JSON",
            MalformedCombinerCode(_) => "MALFORMED_COMBINER_CODE",
            MalformedDocId(_) => "MALFORMED_DOC_ID",
            MalformedVersionedLibpath(_) => "MALFORMED_VERSIONED_LIBPATH",
            MissingInput(_) => "MISSING_INPUT",
            BadAlternativeArgs(_) => "BAD_ALTERNATIVE_ARGS",
            ManifestBadForm(_) => "MANIFEST_BAD_FORM",
            RepoCheckoutFailed(_) => "REPO_CHECKOUT_FAILED",
            ShadowMergeConflict(_) => "SHADOW_MERGE_CONFLICT",
            MissingManifest(_) => "MISSING_MANIFEST",
            MissingDashgraph(_) => "MISSING_DASHGRAPH",
            MissingAnnotation(_) => "MISSING_ANNOTATION",
            ModuleHasNoContents(_) => "MODULE_HAS_NO_CONTENTS",
            Path(_) => "BAD_LIBPATH",
            Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Non-zero numeric band for this error's category. `0` is reserved for
    /// success and is never returned here.
    pub fn err_lvl(&self) -> u16 {
        use PfscError::*;
        match self {
            ParsingError(_) | MesonMissingModal(_) | MesonExcessModal(_)
            | MesonExcessFlow(_) | MesonExcessArrow(..) | MesonBadGhostNode(_)
            | MesonDidNotDeliver(_) | MesonDownwardFlow(_) | ArclangError(_) => 100,
            ModuleDoesNotContainObject(..) | RelativeLibpathCannotBeResolved(_)
            | CyclicImportError(_) | TargetOfWrongType(_) | CannotCloneNode(_)
            | MalformedCf(_) | MalformedQuantifierNodeLabel(_)
            | DuplicateModuleExtension(_) => 200,
            AttemptedReleaseBuildOnSubRepo | AttemptedReleaseReindex
            | MissingRepoChangeLog | NoWipImportsInNumberedReleases
            | BuildMakesDisallowedBreakingChange(_) | InvalidMoveMapping(_)
            | VersionNotBuiltYet(_) | BadHash => 300,
            InadequatePermissions | NoWipMode | ServiceDisabled | SsnrServiceDisabled
            | UserNotLoggedIn | ActionProhibitedByUserSettings | LibpathNotAllowed(_)
            | HostingRequestRejected | HostingRequestUnnecessary => 400,
            InputEmpty(_) | InputTooLong(_) | InputWrongType(_) | BadLibpath(_)
            | MalformedJson(_) | MalformedCombinerCode(_) | MalformedDocId(_)
            | MalformedVersionedLibpath(_) | MissingInput(_) | BadAlternativeArgs(_)
            | ManifestBadForm(_) => 500,
            MissingManifest(_) | MissingDashgraph(_) | MissingAnnotation(_)
            | ModuleHasNoContents(_) | RepoCheckoutFailed(_) | ShadowMergeConflict(_) => 600,
            Path(_) => 500,
            Internal(_) => 900,
        }
    }

    /// Build the `{err_lvl, ...}` JSON envelope (spec §6.3/§6.4). `0` means
    /// success and is produced by `Envelope::ok`, never from a `PfscError`.
    pub fn to_envelope(&self) -> Envelope<()> {
        Envelope {
            err_lvl: self.err_lvl(),
            error_code: Some(self.code()),
            message: Some(self.to_string()),
            data: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PfscError>;

/// The sync-endpoint JSON envelope of spec §6.3: `{err_lvl, orig_req, ...}`.
/// Reused here as plain data; no web framework binds to it in this
/// workspace (the HTTP layer is out of scope, spec §1/§6.3).
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub err_lvl: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope { err_lvl: 0, error_code: None, message: None, data: Some(data) }
    }

    /// Serialises the envelope to the JSON wire format spec §6.3/§6.4
    /// describes a sync endpoint returning.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
