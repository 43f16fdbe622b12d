//! Helpers de serde para distinguir "campo ausente" de "campo null"

use serde::{Deserialize, Deserializer};

/// Envuelve el valor en `Some` cuando la clave existe en el body.
///
/// Usar junto con `#[serde(default)]`: clave ausente -> `None`,
/// `null` -> `Some(None)`, valor -> `Some(Some(v))`.
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
