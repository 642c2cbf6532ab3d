use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// The printable document: an ordered body sequence, a named style table,
/// three optional page hooks, and a pass-through bag for every other
/// docDefinition field (page size, margins, metadata, output options).
///
/// Content nodes stay untyped [`Value`]s. The union of node shapes is open
/// (anything with a `_custom` marker is a legal leaf), so logical kind is
/// recovered by [`crate::classifier::classify`] rather than stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentModel {
    /// Ordered body sequence. Each element is one content node.
    pub content: Vec<Value>,

    /// Style name -> style definition object. Referential integrity with
    /// `style` references in content nodes is not enforced; dangling names
    /// are resolved by the renderer at output time.
    pub styles: Map<String, Value>,

    pub header: Option<PageHook>,
    pub footer: Option<PageHook>,
    pub background: Option<PageHook>,

    /// Every other docDefinition field (`pageSize`, `pageOrientation`,
    /// `pageMargins`, `watermark`, `info`, output-directed fields), carried
    /// verbatim through the codec.
    pub extra: Map<String, Value>,
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook(&self, slot: HookSlot) -> Option<&PageHook> {
        match slot {
            HookSlot::Header => self.header.as_ref(),
            HookSlot::Footer => self.footer.as_ref(),
            HookSlot::Background => self.background.as_ref(),
        }
    }

    pub fn set_hook(&mut self, slot: HookSlot, hook: Option<PageHook>) {
        match slot {
            HookSlot::Header => self.header = hook,
            HookSlot::Footer => self.footer = hook,
            HookSlot::Background => self.background = hook,
        }
    }
}

/// The three document fields that may hold a function instead of plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookSlot {
    Header,
    Footer,
    Background,
}

impl HookSlot {
    pub const ALL: [HookSlot; 3] = [HookSlot::Header, HookSlot::Footer, HookSlot::Background];

    /// Document field name in the stored form.
    pub fn field(self) -> &'static str {
        match self {
            HookSlot::Header => "header",
            HookSlot::Footer => "footer",
            HookSlot::Background => "background",
        }
    }

    /// Sidecar field standing in for a function value in the stored form.
    pub fn sidecar(self) -> &'static str {
        match self {
            HookSlot::Header => "_headerFunction",
            HookSlot::Footer => "_footerFunction",
            HookSlot::Background => "_backgroundFunction",
        }
    }

    /// Positional call contract for a dynamic hook in this slot. The hook's
    /// own declared parameter names may differ; arguments are bound by
    /// position.
    pub fn call_params(self) -> &'static [&'static str] {
        match self {
            HookSlot::Header | HookSlot::Footer => &["currentPage", "pageCount", "pageSize"],
            HookSlot::Background => &["currentPage", "pageSize"],
        }
    }
}

/// A page hook value: plain data, or a function persisted as source text.
#[derive(Debug, Clone, PartialEq)]
pub enum PageHook {
    /// A string, object, or array used as-is for every page.
    Static(Value),
    /// A per-page callback, held as reconstructible source text. Execution is
    /// an injected capability; see [`crate::script::ScriptHost`].
    Dynamic(DynamicFn),
}

/// A function-valued hook in reconstructible form.
///
/// `params` and `body` are extracted from `source` by
/// [`crate::codec::parse_function_source`]; `source` is persisted verbatim so
/// a round trip through storage is lossless.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicFn {
    pub params: Vec<String>,
    pub body: String,
    pub source: String,
}

/// A named, timestamped document plus its identity in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub doc: DocumentModel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Create an empty template (no content, no styles).
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            doc: DocumentModel::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
