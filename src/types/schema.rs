use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Upper cardinality bound of a schema element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxOccurs {
    #[default]
    Unbounded,
    Bounded(u32),
}

impl MaxOccurs {
    pub fn allows_many(&self) -> bool {
        match self {
            MaxOccurs::Unbounded => true,
            MaxOccurs::Bounded(n) => *n > 1,
        }
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Unbounded => write!(f, "*"),
            MaxOccurs::Bounded(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for MaxOccurs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxOccurs::Unbounded => serializer.serialize_str("*"),
            MaxOccurs::Bounded(n) => serializer.serialize_u32(*n),
        }
    }
}

impl<'de> Deserialize<'de> for MaxOccurs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(MaxOccurs::Bounded(n)),
            Raw::Text(text) if text == "*" => Ok(MaxOccurs::Unbounded),
            Raw::Text(text) => text
                .parse::<u32>()
                .map(MaxOccurs::Bounded)
                .map_err(|_| serde::de::Error::custom(format!("invalid maxOccurs: {text}"))),
        }
    }
}

/// One element of a schema tree.
///
/// A type's schema is itself a `SchemaNode` whose `schema_path` is the type
/// name and whose `children` are the type's direct elements. Backbone
/// elements carry their substructure inline in `children`; elements of a
/// named datatype carry only the `datatype` and are resolved on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    pub schema_path: String,
    #[serde(default)]
    pub element_name: String,
    #[serde(default)]
    pub datatype: String,
    #[serde(default)]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: MaxOccurs,
    #[serde(default)]
    pub is_choice: bool,
    #[serde(default)]
    pub is_backbone: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<SchemaNode>>,
}

impl SchemaNode {
    /// Root node of a record type or datatype schema.
    pub fn root(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            schema_path: type_name.clone(),
            element_name: type_name.clone(),
            datatype: type_name,
            min_occurs: 0,
            max_occurs: MaxOccurs::Bounded(1),
            ..Default::default()
        }
    }

    /// Element node; `schema_path` is filled in when attached to a parent.
    pub fn element(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            schema_path: name.clone(),
            element_name: name,
            datatype: datatype.into(),
            min_occurs: 0,
            max_occurs: MaxOccurs::Bounded(1),
            ..Default::default()
        }
    }

    pub fn with_cardinality(mut self, min: u32, max: MaxOccurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn required(self) -> Self {
        let max = self.max_occurs;
        self.with_cardinality(1, max)
    }

    pub fn repeating(self) -> Self {
        let min = self.min_occurs;
        self.with_cardinality(min, MaxOccurs::Unbounded)
    }

    pub fn choice(mut self) -> Self {
        self.is_choice = true;
        self
    }

    /// Marks this element as a backbone whose structure is defined inline.
    pub fn backbone(mut self) -> Self {
        self.is_backbone = true;
        if self.datatype.is_empty() {
            self.datatype = "BackboneElement".to_string();
        }
        self
    }

    /// Attaches a child, rewriting its schema path (and those of its
    /// descendants) relative to this node.
    pub fn with_child(mut self, child: SchemaNode) -> Self {
        let child = child.rebased(&self.schema_path);
        self.children.push(Arc::new(child));
        self
    }

    fn rebased(mut self, parent_path: &str) -> Self {
        self.schema_path = format!("{parent_path}.{}", self.element_name);
        let own_path = self.schema_path.clone();
        self.children = self
            .children
            .into_iter()
            .map(|child| Arc::new(Arc::unwrap_or_clone(child).rebased(&own_path)))
            .collect();
        self
    }

    pub fn is_array(&self) -> bool {
        self.max_occurs.allows_many()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Direct child by exact element name.
    pub fn child(&self, name: &str) -> Option<&Arc<SchemaNode>> {
        self.children.iter().find(|c| c.element_name == name)
    }

    /// Abstract polymorphic placeholder such as `value[x]`.
    pub fn is_choice_placeholder(&self) -> bool {
        self.is_choice && self.element_name.ends_with("[x]")
    }

    pub fn cardinality(&self) -> String {
        format!("{}..{}", self.min_occurs, self.max_occurs)
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaNode({}", self.schema_path)?;
        if !self.datatype.is_empty() {
            write!(f, ": {}", self.datatype)?;
        }
        write!(f, " {})", self.cardinality())
    }
}
