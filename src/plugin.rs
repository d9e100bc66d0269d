//! Request-level driver: options, per-file generation, and the protoc plugin
//! envelope.
//!
//! A request either produces one unit per requested file or fails as a whole;
//! there is never partial output.

use std::io::{Read, Write};
use std::path::Path;

use prost::Message as _;
use prost_types::FileDescriptorProto;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

use crate::ast::{MemberKind, TypeDeclaration, Unit};
use crate::codegen::{TypeIndex, generate_unit};
use crate::error::{Error, Result};
use crate::render::render_unit;
use crate::schema::SchemaFile;
use crate::type_map::RuntimeSupport;

/// Plugin parameter key selecting a custom runtime namespace.
pub const RUNTIME_NAMESPACE_OPTION: &str = "runtime_namespace";

/// Generation options parsed from the plugin parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Runtime unit namespace; `None` selects the reference runtime.
    pub runtime_namespace: Option<String>,
}

impl Options {
    /// Parse a comma-separated `key=value` list.
    ///
    /// Blank entries are skipped. Any key other than `runtime_namespace`,
    /// including an entry without `=`, is rejected.
    pub fn parse(parameter: &str) -> Result<Self> {
        let mut options = Options::default();
        for entry in parameter.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((key, value)) if key.trim() == RUNTIME_NAMESPACE_OPTION => {
                    options = Options::with_runtime_namespace(Some(value));
                }
                Some((key, _)) => {
                    return Err(Error::UnimplementedOption {
                        key: key.trim().to_string(),
                    });
                }
                None => {
                    return Err(Error::UnimplementedOption {
                        key: entry.to_string(),
                    });
                }
            }
        }
        Ok(options)
    }

    /// Options selecting the runtime under `namespace`. A blank namespace
    /// selects the reference runtime.
    pub fn with_runtime_namespace(namespace: Option<&str>) -> Self {
        Options {
            runtime_namespace: namespace
                .map(str::trim)
                .filter(|namespace| !namespace.is_empty())
                .map(str::to_string),
        }
    }

    pub fn runtime(&self) -> RuntimeSupport {
        match &self.runtime_namespace {
            Some(namespace) => RuntimeSupport::custom(namespace),
            None => RuntimeSupport::reference(),
        }
    }
}

/// One generated output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Output path relative to the output root.
    pub path: String,
    pub unit: Unit,
    pub content: String,
}

/// Counts reported after generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    pub units: usize,
    pub classes: usize,
    pub enums: usize,
}

impl GenerationStats {
    pub fn collect(units: &[GeneratedUnit]) -> Self {
        let mut stats = GenerationStats {
            units: units.len(),
            ..Default::default()
        };
        for generated in units {
            for declaration in &generated.unit.types {
                stats.count(declaration);
            }
        }
        stats
    }

    fn count(&mut self, declaration: &TypeDeclaration) {
        match declaration {
            TypeDeclaration::ForwardClass { .. } => {}
            TypeDeclaration::Enum(_) => self.enums += 1,
            TypeDeclaration::Class(class) => {
                self.classes += 1;
                for member in &class.members {
                    if let MemberKind::NestedType(nested) = &member.kind {
                        self.count(nested);
                    }
                }
            }
        }
    }
}

/// Generate a unit for each file in `files_to_generate`.
///
/// `proto_files` must contain every requested file and everything they
/// import, as protoc supplies them.
pub fn generate(
    proto_files: &[FileDescriptorProto],
    files_to_generate: &[String],
    options: &Options,
) -> Result<Vec<GeneratedUnit>> {
    let runtime = options.runtime();
    let schemas = proto_files
        .iter()
        .map(SchemaFile::from_descriptor)
        .collect::<Result<Vec<_>>>()?;
    let index = TypeIndex::build(&schemas)?;

    let mut units = Vec::with_capacity(files_to_generate.len());
    for name in files_to_generate {
        let schema = schemas
            .iter()
            .find(|schema| &schema.name == name)
            .ok_or_else(|| Error::MissingFile {
                name: name.clone(),
                referenced_by: "files to generate".to_string(),
            })?;
        let unit = generate_unit(schema, &index, &runtime)?;
        let path = index.unit(&schema.name, &schema.name)?.output_path();
        let content = render_unit(&unit);
        log::debug!("{name} -> {path} ({} bytes)", content.len());
        units.push(GeneratedUnit {
            path,
            unit,
            content,
        });
    }

    let stats = GenerationStats::collect(&units);
    log::info!(
        "generated {} units ({} classes, {} enums) with runtime {}",
        stats.units,
        stats.classes,
        stats.enums,
        runtime.namespace()
    );
    Ok(units)
}

/// Answer a compiler request. Failures become the response's `error`.
pub fn respond(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    let result = Options::parse(request.parameter())
        .and_then(|options| generate(&request.proto_file, &request.file_to_generate, &options));

    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };
    match result {
        Ok(units) => {
            response.file = units
                .into_iter()
                .map(|generated| File {
                    name: Some(generated.path),
                    content: Some(generated.content),
                    ..Default::default()
                })
                .collect();
        }
        Err(e) => {
            log::error!("generation failed: {e}");
            response.error = Some(e.to_string());
        }
    }
    response
}

/// Read a serialized request from `input` and write the response to `output`.
pub fn run_plugin(mut input: impl Read, mut output: impl Write) -> Result<()> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;
    let request = CodeGeneratorRequest::decode(buf.as_slice())?;

    let response = respond(&request);

    let mut encoded = Vec::with_capacity(response.encoded_len());
    response.encode(&mut encoded)?;
    output.write_all(&encoded)?;
    output.flush()?;
    Ok(())
}

/// Write generated units below `output_dir`, creating directories as needed.
pub fn write_units(output_dir: &Path, units: &[GeneratedUnit]) -> Result<()> {
    for generated in units {
        let path = output_dir.join(&generated.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&path, &generated.content).map_err(|e| Error::Write {
            path: path.clone(),
            source: e,
        })?;
    }
    Ok(())
}
