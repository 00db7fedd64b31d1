//! Schema registry
//!
//! The fixed whitelist of component types the model is allowed to produce,
//! with their prop shapes. Built once per process and never mutated.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::OnceLock;

static GLOBAL_REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

/// Fallback container used when a node has to be replaced.
pub const FALLBACK_COMPONENT: &str = "Container";

/// Prop value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    String,
    Number,
    Boolean,
    Array,
    Enum,
}

impl PropKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Enum => "enum",
        }
    }
}

/// Declaration of a single prop.
#[derive(Debug, Clone)]
pub struct PropSchema {
    pub kind: PropKind,
    pub required: bool,
    pub enum_values: Vec<&'static str>,
    pub description: &'static str,
    /// Field shapes of array-of-object props, in declaration order.
    pub item_schema: Vec<(&'static str, PropSchema)>,
}

impl PropSchema {
    fn new(kind: PropKind, description: &'static str) -> Self {
        Self {
            kind,
            required: false,
            enum_values: Vec::new(),
            description,
            item_schema: Vec::new(),
        }
    }

    fn string(description: &'static str) -> Self {
        Self::new(PropKind::String, description)
    }

    fn number(description: &'static str) -> Self {
        Self::new(PropKind::Number, description)
    }

    fn boolean(description: &'static str) -> Self {
        Self::new(PropKind::Boolean, description)
    }

    fn array(description: &'static str) -> Self {
        Self::new(PropKind::Array, description)
    }

    fn one_of(values: &[&'static str], description: &'static str) -> Self {
        Self {
            enum_values: values.to_vec(),
            ..Self::new(PropKind::Enum, description)
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn items(mut self, fields: Vec<(&'static str, PropSchema)>) -> Self {
        self.item_schema = fields;
        self
    }
}

/// Declaration of a whitelisted component.
#[derive(Debug, Clone)]
pub struct ComponentSchema {
    pub name: &'static str,
    pub description: &'static str,
    /// Props in declaration order.
    pub props: Vec<(&'static str, PropSchema)>,
    pub accepts_children: bool,
}

impl ComponentSchema {
    pub fn prop(&self, name: &str) -> Option<&PropSchema> {
        self.props
            .iter()
            .find(|(prop_name, _)| *prop_name == name)
            .map(|(_, schema)| schema)
    }

    pub fn required_props(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.props
            .iter()
            .filter(|(_, schema)| schema.required)
            .map(|(name, _)| *name)
    }
}

/// Immutable registry of allowed components.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    components: Vec<ComponentSchema>,
}

impl SchemaRegistry {
    /// Process-wide registry with the built-in component library.
    pub fn global() -> &'static SchemaRegistry {
        GLOBAL_REGISTRY.get_or_init(SchemaRegistry::builtin)
    }

    /// Build a registry from explicit component declarations.
    pub fn from_components(components: Vec<ComponentSchema>) -> Self {
        Self { components }
    }

    /// Names of every allowed component.
    pub fn names(&self) -> BTreeSet<&'static str> {
        self.components.iter().map(|c| c.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentSchema> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Components in declaration order.
    pub fn components(&self) -> &[ComponentSchema] {
        &self.components
    }

    /// Model-readable description of the whole component library.
    pub fn describe(&self) -> String {
        let mut buf = String::new();
        for (idx, schema) in self.components.iter().enumerate() {
            if idx > 0 {
                buf.push_str("\n\n");
            }
            let _ = writeln!(buf, "**{}**: {}", schema.name, schema.description);
            let _ = writeln!(
                buf,
                "  Children: {}",
                if schema.accepts_children { "yes" } else { "no" }
            );
            buf.push_str("  Props:");
            for (name, prop) in &schema.props {
                buf.push('\n');
                append_prop_line(&mut buf, "  ", name, prop);
                for (field, field_schema) in &prop.item_schema {
                    buf.push('\n');
                    append_prop_line(&mut buf, "      ", field, field_schema);
                }
            }
        }
        buf
    }

    fn builtin() -> Self {
        use PropSchema as P;

        let components = vec![
            ComponentSchema {
                name: "Container",
                description: "Layout container for arranging child components",
                props: vec![
                    ("direction", P::one_of(&["row", "column"], "Flex direction")),
                    (
                        "gap",
                        P::one_of(&["none", "sm", "md", "lg"], "Gap between children"),
                    ),
                    (
                        "padding",
                        P::one_of(&["none", "sm", "md", "lg", "xl"], "Padding"),
                    ),
                    (
                        "align",
                        P::one_of(&["start", "center", "end", "stretch"], "Align items"),
                    ),
                    (
                        "justify",
                        P::one_of(
                            &["start", "center", "end", "between", "around"],
                            "Justify content",
                        ),
                    ),
                    ("wrap", P::boolean("Flex wrap")),
                ],
                accepts_children: true,
            },
            ComponentSchema {
                name: "Text",
                description: "Text element with predefined variants",
                props: vec![
                    ("content", P::string("Text content").required()),
                    (
                        "variant",
                        P::one_of(&["h1", "h2", "h3", "p", "span", "label"], "Text variant"),
                    ),
                    (
                        "weight",
                        P::one_of(&["normal", "medium", "bold"], "Font weight"),
                    ),
                    (
                        "color",
                        P::one_of(
                            &["default", "muted", "primary", "danger", "success"],
                            "Text color",
                        ),
                    ),
                ],
                accepts_children: false,
            },
            ComponentSchema {
                name: "Button",
                description: "Clickable button",
                props: vec![
                    ("text", P::string("Button label").required()),
                    (
                        "variant",
                        P::one_of(
                            &["primary", "secondary", "danger", "ghost"],
                            "Button style variant",
                        ),
                    ),
                    ("size", P::one_of(&["sm", "md", "lg"], "Button size")),
                    ("disabled", P::boolean("Disabled state")),
                    ("fullWidth", P::boolean("Full width button")),
                ],
                accepts_children: false,
            },
            ComponentSchema {
                name: "Input",
                description: "Text input field",
                props: vec![
                    ("label", P::string("Input label")),
                    ("placeholder", P::string("Placeholder text")),
                    (
                        "type",
                        P::one_of(
                            &["text", "password", "email", "number", "search", "tel"],
                            "Input type",
                        ),
                    ),
                    ("disabled", P::boolean("Disabled state")),
                    ("value", P::string("Default value")),
                    ("required", P::boolean("Required field")),
                ],
                accepts_children: false,
            },
            ComponentSchema {
                name: "Card",
                description: "Card container with optional title and subtitle",
                props: vec![
                    ("title", P::string("Card title")),
                    ("subtitle", P::string("Card subtitle")),
                    ("padding", P::one_of(&["sm", "md", "lg"], "Card padding")),
                ],
                accepts_children: true,
            },
            ComponentSchema {
                name: "Modal",
                description: "Modal dialog overlay",
                props: vec![
                    ("title", P::string("Modal title").required()),
                    ("isOpen", P::boolean("Whether modal is visible")),
                ],
                accepts_children: true,
            },
            ComponentSchema {
                name: "Navbar",
                description: "Top navigation bar",
                props: vec![
                    ("title", P::string("Brand/title").required()),
                    (
                        "links",
                        P::array("Navigation links").items(vec![
                            ("text", P::string("Link text").required()),
                            ("href", P::string("Link URL")),
                        ]),
                    ),
                ],
                accepts_children: false,
            },
            ComponentSchema {
                name: "Sidebar",
                description: "Side navigation panel",
                props: vec![
                    (
                        "items",
                        P::array("Sidebar menu items").items(vec![
                            ("text", P::string("Item text").required()),
                            ("active", P::boolean("Active state")),
                            ("icon", P::string("Icon name")),
                        ]),
                    ),
                    ("title", P::string("Sidebar title")),
                ],
                accepts_children: false,
            },
            ComponentSchema {
                name: "Table",
                description: "Data table",
                props: vec![
                    ("headers", P::array("Column headers")),
                    ("rows", P::array("Table rows (array of arrays)")),
                    ("striped", P::boolean("Striped rows")),
                ],
                accepts_children: false,
            },
            ComponentSchema {
                name: "Chart",
                description: "Simple chart visualization (mock rendering)",
                props: vec![
                    ("type", P::one_of(&["bar", "line", "pie"], "Chart type")),
                    ("title", P::string("Chart title")),
                    (
                        "data",
                        P::array("Chart data points").items(vec![
                            ("label", P::string("Data label").required()),
                            ("value", P::number("Data value").required()),
                        ]),
                    ),
                ],
                accepts_children: false,
            },
        ];

        Self { components }
    }
}

fn append_prop_line(buf: &mut String, indent: &str, name: &str, prop: &PropSchema) {
    let _ = write!(buf, "{}- {}: {}", indent, name, prop.kind.as_str());
    if !prop.enum_values.is_empty() {
        let _ = write!(buf, " ({})", prop.enum_values.join(" | "));
    }
    if prop.required {
        buf.push_str(" [required]");
    }
    if !prop.description.is_empty() {
        let _ = write!(buf, " - {}", prop.description);
    }
}
