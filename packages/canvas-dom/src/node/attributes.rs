use std::ops::Deref;

/// A single attribute. `name` may carry a namespace prefix (`xlink:href`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Insertion-ordered attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    inner: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|attr| attr.name == name)
    }

    /// Set `name`, keeping its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.inner.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.inner.push(Attribute { name, value }),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.inner.iter().position(|attr| attr.name == name)?;
        Some(self.inner.remove(index).value)
    }

    /// Set every attribute of `other`, leaving the rest untouched.
    pub fn merge(&mut self, other: &Attributes) {
        for attr in other.iter() {
            self.set(attr.name.clone(), attr.value.clone());
        }
    }

    pub fn merged(mut self, other: &Attributes) -> Self {
        self.merge(other);
        self
    }

    /// AND of exact matches. An empty criteria list matches everything.
    pub fn matches<K: AsRef<str>, V: AsRef<str>>(&self, criteria: &[(K, V)]) -> bool {
        criteria
            .iter()
            .all(|(name, value)| self.get(name.as_ref()) == Some(value.as_ref()))
    }
}

impl Deref for Attributes {
    type Target = [Attribute];
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.set(name, value);
        }
        attrs
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Attributes {
    fn from(value: [(K, V); N]) -> Self {
        value.into_iter().collect()
    }
}

/// Build [`Attributes`] from `name => value` pairs. Values go through `ToString`.
#[macro_export]
macro_rules! attrs {
    () => { $crate::Attributes::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Attributes::from_iter([$(($name, ($value).to_string())),+])
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn set_keeps_order_and_overwrites() {
        let mut attrs = attrs! { "x" => 1, "y" => 2 };
        attrs.set("x", "5");
        attrs.set("fill", "red");
        let names: Vec<_> = attrs.iter().map(|attr| attr.name.as_str()).collect();
        assert_eq!(names, ["x", "y", "fill"]);
        assert_eq!(attrs.get("x"), Some("5"));
        assert_eq!(attrs.get_f64("y"), Some(2.0));
    }

    #[test]
    fn matches_is_an_exact_and() {
        let attrs = attrs! { "class" => "node", "data-id" => 7 };
        assert!(attrs.matches(&[("class", "node")]));
        assert!(attrs.matches(&[("class", "node"), ("data-id", "7")]));
        assert!(!attrs.matches(&[("class", "node"), ("data-id", "8")]));
        assert!(!attrs.matches(&[("class", "nod")]));
        assert!(attrs.matches::<&str, &str>(&[]));
    }
}
