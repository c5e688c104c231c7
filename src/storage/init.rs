//! Storage initialization
//!
//! Handles first-run setup: directories, settings and a starter schema

use crate::config::paths::AuditPaths;
use crate::config::Settings;
use crate::error::AuditError;
use crate::schema::{PropertyDescriptor as P, TypeDescriptor as T};

use super::file_io::write_json_atomic;
use super::schema::SchemaData;

/// Initialize storage for a fresh installation
///
/// Writes the demo schema and default settings unless they already exist.
pub fn initialize_storage(paths: &AuditPaths) -> Result<(), AuditError> {
    paths.ensure_directories()?;

    if !paths.schema_file().exists() {
        let data = SchemaData {
            types: demo_schema(),
        };
        write_json_atomic(paths.schema_file(), &data)?;
    }

    if !paths.settings_file().exists() {
        Settings::default().save(paths)?;
    }

    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &AuditPaths) -> bool {
    !paths.is_initialized()
}

/// A small clinical data model covering every shape the policy cares about:
/// interfaces, abstract bases, subclass chains, owned collections,
/// association cycles and a non-auditable type.
pub fn demo_schema() -> Vec<T> {
    vec![
        T::new("clinic.Auditable").interface(),
        T::new("clinic.BaseMetadata")
            .abstract_type()
            .implements("clinic.Auditable")
            .property(P::scalar("name"))
            .property(P::scalar("description"))
            .property(P::scalar("dateChanged"))
            .property(P::reference("changedBy", "clinic.User")),
        T::new("clinic.User").property(P::scalar("username")),
        T::new("clinic.Concept")
            .implements("clinic.Auditable")
            .property(P::scalar("version"))
            .property(P::reference("datatype", "clinic.ConceptDatatype"))
            .property(P::reference("conceptClass", "clinic.ConceptClass"))
            .property(P::collection("names", "clinic.ConceptName"))
            .property(P::collection("descriptions", "clinic.ConceptDescription"))
            .property(P::collection("settings", "clinic.Setting"))
            .property(P::scalar("dateChanged"))
            .property(P::reference("changedBy", "clinic.User")),
        T::new("clinic.ConceptNumeric")
            .extends("clinic.Concept")
            .property(P::scalar("hiAbsolute"))
            .property(P::scalar("units")),
        T::new("clinic.ConceptComplex")
            .extends("clinic.Concept")
            .property(P::scalar("handler")),
        T::new("clinic.ConceptName")
            .property(P::scalar("name"))
            .property(P::scalar("locale"))
            .property(P::reference("concept", "clinic.Concept"))
            .property(P::collection("tags", "clinic.ConceptNameTag")),
        T::new("clinic.ConceptNameTag").property(P::scalar("tag")),
        T::new("clinic.ConceptDescription")
            .property(P::scalar("description"))
            .property(P::reference("concept", "clinic.Concept")),
        T::new("clinic.ConceptClass").extends("clinic.BaseMetadata"),
        T::new("clinic.ConceptDatatype").extends("clinic.BaseMetadata"),
        T::new("clinic.EncounterType").extends("clinic.BaseMetadata"),
        T::new("clinic.Location")
            .extends("clinic.BaseMetadata")
            .property(P::scalar("address1"))
            .property(P::collection("childLocations", "clinic.Location")),
        T::new("clinic.Person")
            .property(P::scalar("gender"))
            .property(P::scalar("birthdate"))
            .property(P::collection("names", "clinic.PersonName")),
        T::new("clinic.Patient")
            .extends("clinic.Person")
            .property(P::collection("identifiers", "clinic.PatientIdentifier")),
        T::new("clinic.PersonName")
            .property(P::scalar("givenName"))
            .property(P::scalar("familyName")),
        T::new("clinic.PatientIdentifier")
            .property(P::scalar("identifier"))
            .property(P::reference("identifierType", "clinic.PatientIdentifierType")),
        T::new("clinic.PatientIdentifierType")
            .extends("clinic.BaseMetadata")
            .property(P::scalar("format")),
        T::new("clinic.Setting")
            .not_auditable()
            .property(P::scalar("property"))
            .property(P::scalar("value")),
    ]
}
