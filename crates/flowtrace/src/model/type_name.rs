//! Type reference parsing
//!
//! Type references in the model are plain strings such as
//! `System.Collections.Generic.List<Shop.Billing.Invoice>` or
//! `Shop.Billing.Invoice[]`. [`TypeRef`] parses them with chumsky so the
//! extractor can unwrap collections and the document can print short names.

use std::fmt;

use chumsky::prelude::*;

/// Generic type definitions treated as collections of their first argument
const ENUMERABLES: &[&str] = &[
    "IEnumerable",
    "ICollection",
    "IList",
    "IReadOnlyCollection",
    "IReadOnlyList",
    "List",
    "HashSet",
    "ISet",
    "Collection",
];

/// A parsed type reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Fully-qualified name without generic arguments
    pub name: String,
    /// Generic arguments in declaration order
    pub arguments: Vec<TypeRef>,
    /// Number of trailing `[]` suffixes
    pub array_rank: usize,
}

impl TypeRef {
    /// Parse a type reference. Input the grammar cannot handle becomes a
    /// plain, non-generic reference holding the trimmed text.
    pub fn parse(input: &str) -> Self {
        type_ref_parser()
            .then_ignore(end())
            .parse(input.trim())
            .into_result()
            .unwrap_or_else(|_| Self::plain(input.trim()))
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            array_rank: 0,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.arguments.is_empty()
    }

    pub fn is_array(&self) -> bool {
        self.array_rank > 0
    }

    /// Last dotted segment of the name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Everything before the last dotted segment
    pub fn namespace(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(namespace, _)| namespace)
            .unwrap_or("")
    }

    /// True for arrays and the well-known generic collection types
    pub fn is_enumerable(&self) -> bool {
        self.is_array()
            || (self.arguments.len() == 1 && ENUMERABLES.contains(&self.simple_name()))
    }

    /// Element type of an enumerable reference
    pub fn element(&self) -> Option<TypeRef> {
        if self.is_array() {
            let mut element = self.clone();
            element.array_rank -= 1;
            Some(element)
        } else if self.is_enumerable() {
            self.arguments.first().cloned()
        } else {
            None
        }
    }

    /// Strip arrays and follow first generic arguments down to the innermost type
    pub fn innermost(&self) -> TypeRef {
        let mut current = self.clone();
        loop {
            if current.is_array() {
                current.array_rank = 0;
            } else if let Some(first) = current.arguments.first() {
                current = first.clone();
            } else {
                return current;
            }
        }
    }

    /// Short form for diagrams and tables: simple names all the way down
    pub fn for_diagram(&self) -> String {
        let mut out = self.simple_name().to_string();
        if self.is_generic() {
            let arguments: Vec<_> = self.arguments.iter().map(TypeRef::for_diagram).collect();
            out.push('<');
            out.push_str(&arguments.join(", "));
            out.push('>');
        }
        for _ in 0..self.array_rank {
            out.push_str("[]");
        }
        out
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_generic() {
            write!(f, "<")?;
            for (index, argument) in self.arguments.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", argument)?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.array_rank {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

fn type_ref_parser<'src>() -> impl Parser<'src, &'src str, TypeRef> + Clone {
    recursive(|type_ref| {
        let name = none_of("<>,[]")
            .repeated()
            .at_least(1)
            .to_slice()
            .map(|s: &str| s.trim().to_string());

        let generic_arguments = type_ref
            .separated_by(just(','))
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just('<'), just('>'));

        let array_rank = just("[]")
            .padded()
            .repeated()
            .collect::<Vec<_>>()
            .map(|suffixes| suffixes.len());

        name.then(generic_arguments.or_not())
            .then(array_rank)
            .map(|((name, arguments), array_rank)| TypeRef {
                name,
                arguments: arguments.unwrap_or_default(),
                array_rank,
            })
    })
}
