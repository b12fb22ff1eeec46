//! # Scoped Keys
//!
//! Purpose: Map a `(scope, key)` pair onto the single string key stored in
//! the shared table, so independent services never collide.
//!
//! ## Encoding
//!
//! ```text
//! escape(scope) + "@" + key
//!
//! escape: "\" -> "\\"
//!         "@" -> "\@"
//! ```
//!
//! The first unescaped `@` terminates the scope, so the encoding is
//! injective: two distinct pairs never share a stored key. A scope without
//! `@` or `\` encodes to plain `scope@key`, the layout existing rows use.
//! The key part is stored verbatim.

use std::fmt;

/// Separator between the encoded scope and the key.
pub const SCOPE_SEPARATOR: char = '@';

/// Escape character used inside the scope part.
pub const SCOPE_ESCAPE: char = '\\';

/// Borrowed `(scope, key)` pair addressing one stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopedKey<'a> {
    scope: &'a str,
    key: &'a str,
}

impl<'a> ScopedKey<'a> {
    /// Creates a scoped key. Neither part is validated.
    #[inline]
    pub const fn new(scope: &'a str, key: &'a str) -> Self {
        ScopedKey { scope, key }
    }

    #[inline]
    pub const fn scope(&self) -> &'a str {
        self.scope
    }

    #[inline]
    pub const fn key(&self) -> &'a str {
        self.key
    }

    /// Encodes the pair into the stored key string.
    ///
    /// # Examples
    /// ```rust
    /// use skv_common::ScopedKey;
    ///
    /// assert_eq!(ScopedKey::new("user", "324234").encode(), "user@324234");
    /// assert_eq!(ScopedKey::new("a@b", "c").encode(), "a\\@b@c");
    /// ```
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.scope.len() + self.key.len() + 1);
        for ch in self.scope.chars() {
            if ch == SCOPE_SEPARATOR || ch == SCOPE_ESCAPE {
                out.push(SCOPE_ESCAPE);
            }
            out.push(ch);
        }
        out.push(SCOPE_SEPARATOR);
        out.push_str(self.key);
        out
    }

    /// Splits a stored key back into `(scope, key)`.
    ///
    /// Returns `None` when no unescaped separator is present or the scope
    /// ends in a dangling escape.
    pub fn decode(encoded: &str) -> Option<(String, String)> {
        let mut scope = String::new();
        let mut chars = encoded.char_indices();
        while let Some((idx, ch)) = chars.next() {
            match ch {
                SCOPE_ESCAPE => {
                    let (_, escaped) = chars.next()?;
                    scope.push(escaped);
                }
                SCOPE_SEPARATOR => {
                    let rest = &encoded[idx + SCOPE_SEPARATOR.len_utf8()..];
                    return Some((scope, rest.to_string()));
                }
                _ => scope.push(ch),
            }
        }
        None
    }
}

impl fmt::Display for ScopedKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
