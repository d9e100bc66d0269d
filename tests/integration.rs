//! End-to-end integration tests for protoc-gen-delphi.
//!
//! Descriptors are built by hand, the way protoc would hand them to the
//! plugin, and run through the complete pipeline: descriptor conversion,
//! unit generation, rendering, and the plugin envelope.

use std::path::Path;

use pretty_assertions::assert_eq;
use prost::Message as _;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, OneofDescriptorProto,
};
use protoc_gen_delphi::error::Error;
use protoc_gen_delphi::plugin::{self, GeneratedUnit, Options};

/// `common/color.proto`: a top-level enum in its own package.
fn color_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("common/color.proto".to_string()),
        package: Some("demo.common".to_string()),
        syntax: Some("proto3".to_string()),
        enum_type: vec![enumeration(
            "Color",
            &[("COLOR_UNSPECIFIED", 0), ("COLOR_RED", 1), ("COLOR_BLUE", 7)],
        )],
        ..Default::default()
    }
}

/// `demo/shapes.proto`: scalars, a oneof, nested types, repeated fields and
/// a cross-file enum reference.
fn shapes_file() -> FileDescriptorProto {
    let point = message(
        "Point",
        vec![field("x", 1, Type::Int32), field("y", 2, Type::Int32)],
    );

    let mut shape = message(
        "Shape",
        vec![
            field("name", 1, Type::String),
            typed("origin", 2, Type::Message, ".demo.shapes.Point"),
            repeated(typed("vertices", 3, Type::Message, ".demo.shapes.Point")),
            in_oneof(field("a", 4, Type::String), 0),
            in_oneof(field("b", 5, Type::Int32), 0),
            in_oneof(typed("c", 6, Type::Message, ".demo.shapes.Point"), 0),
            typed("color", 7, Type::Enum, ".demo.common.Color"),
            repeated(typed("palette", 8, Type::Enum, ".demo.common.Color")),
            field("data", 9, Type::Bytes),
            typed("style", 10, Type::Message, ".demo.shapes.Shape.Style"),
            typed("kind", 11, Type::Enum, ".demo.shapes.Shape.Kind"),
        ],
    );
    shape.oneof_decl.push(OneofDescriptorProto {
        name: Some("choice".to_string()),
        ..Default::default()
    });
    shape
        .nested_type
        .push(message("Style", vec![field("filled", 1, Type::Bool)]));
    shape
        .enum_type
        .push(enumeration("Kind", &[("KIND_NONE", 0), ("KIND_POLYGON", 3)]));

    FileDescriptorProto {
        name: Some("demo/shapes.proto".to_string()),
        package: Some("demo.shapes".to_string()),
        dependency: vec!["common/color.proto".to_string()],
        syntax: Some("proto3".to_string()),
        message_type: vec![point, shape],
        ..Default::default()
    }
}

fn generate_all() -> Vec<GeneratedUnit> {
    plugin::generate(
        &[color_file(), shapes_file()],
        &[
            "common/color.proto".to_string(),
            "demo/shapes.proto".to_string(),
        ],
        &Options::default(),
    )
    .expect("generation should succeed")
}

fn shapes_unit() -> String {
    generate_all()
        .into_iter()
        .find(|unit| unit.path.ends_with("uShapes.pas"))
        .expect("shapes unit")
        .content
}

#[test]
fn end_to_end_generate_and_write() {
    let dir = tempdir();
    let units = generate_all();
    plugin::write_units(&dir, &units).unwrap();

    assert!(dir.join("Demo/Common/Demo.Common.uColor.pas").exists());
    assert!(dir.join("Demo/Shapes/Demo.Shapes.uShapes.pas").exists());
    assert_eq!(walkdir(&dir).len(), 2);
}

#[test]
fn point_has_constants_presence_and_ordered_encode() {
    let unit = shapes_unit();

    assert!(unit.contains("PROTOBUF_FIELD_NUMBER_X = 1;"));
    assert!(unit.contains("PROTOBUF_FIELD_NUMBER_Y = 2;"));
    assert!(unit.contains("PROTOBUF_FIELD_NAME_X = 'x';"));
    assert!(unit.contains("FX: Int32;"));
    assert!(unit.contains("property X: Int32 read GetX write SetX;"));
    assert!(unit.contains("property HasX: Boolean read GetHasX write SetHasX;"));
    assert!(unit.contains("function TPoint.GetHasX: Boolean;\nbegin\n  Result := (FX <> 0);\nend;"));

    let encode_x = unit
        .find("gProtobufWireCodecInt32.EncodeSingularField(FX, PROTOBUF_FIELD_NUMBER_X, aDest);")
        .unwrap();
    let encode_y = unit
        .find("gProtobufWireCodecInt32.EncodeSingularField(FY, PROTOBUF_FIELD_NUMBER_Y, aDest);")
        .unwrap();
    assert!(encode_x < encode_y);
}

#[test]
fn oneof_case_enum_and_transitions() {
    let unit = shapes_unit();

    assert!(unit.contains(
        "TChoiceCase = (\n        ChoiceCaseNone = 0,\n        ChoiceCaseA = 1,\n        ChoiceCaseB = 2,\n        ChoiceCaseC = 3\n      );"
    ));
    assert!(unit.contains("property Choice: TChoiceCase read GetChoice write SetChoice;"));

    // Assigning a member selects it.
    assert!(unit.contains(
        "procedure TShape.SetA(aValue: UnicodeString);\nbegin\n  HasA := True;\n  FA := aValue;\nend;"
    ));
    // Member presence is the case value.
    assert!(unit.contains("Result := (FChoice = TChoiceCase.ChoiceCaseB);"));
    // Member presence setters route through the case property.
    assert!(unit.contains("Choice := TChoiceCase.ChoiceCaseB;"));
    assert!(unit.contains("Choice := TChoiceCase.ChoiceCaseNone;"));

    // The case setter releases the old member and initializes the new one.
    let setter_start = unit
        .find("procedure TShape.SetChoice(aValue: TChoiceCase);")
        .unwrap();
    let setter = &unit[setter_start..];
    let setter = &setter[..setter.find("\nend;\n").unwrap()];
    assert!(setter.contains("if aValue <> FChoice then"));
    assert!(setter.contains("FC.Free;\n        FC := nil;"));
    assert!(setter.contains("FChoice := aValue;"));
    assert!(setter.contains("FC := TPoint.Create;"));
    assert!(setter.contains("FB := 0;"));

    assert!(unit.contains("FChoice := TChoiceCase.ChoiceCaseNone;"));
}

#[test]
fn cross_unit_and_nested_references() {
    let unit = shapes_unit();

    assert!(unit.contains("  Demo.Common.uColor,\n"));
    assert!(unit.contains("property Color: Demo.Common.uColor.TColor read GetColor write SetColor;"));
    assert!(unit.contains("FColor: TProtobufEnumFieldValue;"));
    assert!(unit.contains("Result := Demo.Common.uColor.TColor(FColor);"));
    assert!(unit.contains("FColor := Ord(aValue);"));
    assert!(unit.contains(
        "property Palette: TProtobufRepeatedField<Demo.Common.uColor.TColor> read GetPalette write SetPalette;"
    ));

    assert!(unit.contains("TStyle = class;"));
    assert!(unit.contains("procedure TShape.TStyle.SetFilled(aValue: Boolean);"));
    assert!(unit.contains("property Style: TShape.TStyle read GetStyle write SetStyle;"));
    assert!(unit.contains("Result := TShape.TKind(FKind);"));
    assert!(unit.contains("KindPolygon = 3"));

    let color = generate_all()
        .into_iter()
        .find(|unit| unit.path.ends_with("uColor.pas"))
        .unwrap()
        .content;
    assert!(color.contains("ColorBlue = 7"));
    assert!(color.contains("unit Demo.Common.uColor;"));
}

#[test]
fn message_and_repeated_fields_own_their_values() {
    let unit = shapes_unit();

    assert!(unit.contains("FVertices := TProtobufRepeatedMessageField<TPoint>.Create;"));
    assert!(unit.contains("FVertices.EncodeAsRepeatedField(aDest, PROTOBUF_FIELD_NUMBER_VERTICES);"));
    assert!(unit.contains(
        "FPalette.EncodeAsRepeatedField(aDest, PROTOBUF_FIELD_NUMBER_PALETTE, gProtobufWireCodecEnum);"
    ));
    assert!(unit.contains("FOrigin.DecodeAsUnknownSingularField(Self, PROTOBUF_FIELD_NUMBER_ORIGIN);"));
    assert!(unit.contains("Result := Assigned(FOrigin);"));
    assert!(unit.contains("Result := (Length(FData) > 0);"));
    assert!(unit.contains("/// <remarks>The message owns the instance."));
    assert!(unit.contains("/// <remarks>The message owns the collection."));
    assert!(!unit.contains("HasVertices"));

    // Destroy frees owned values in reverse declaration order.
    let destroy_start = unit.find("destructor TShape.Destroy;").unwrap();
    let destroy = &unit[destroy_start..];
    let style = destroy.find("FStyle.Free;").unwrap();
    let vertices = destroy.find("FVertices.Free;").unwrap();
    let origin = destroy.find("FOrigin.Free;").unwrap();
    let inherited = destroy.find("inherited Destroy;").unwrap();
    assert!(style < vertices && vertices < origin && origin < inherited);
}

#[test]
fn lifecycle_fragments_of_message_and_oneof_fields() {
    let unit = shapes_unit();

    // Singular message merge recurses into an existing value, otherwise copies.
    assert!(unit.contains(
        "  if aSource.HasOrigin then\n  begin\n    if HasOrigin then\n    begin\n      FOrigin.MergeFrom(aSource.FOrigin);\n    end\n    else\n    begin\n      Origin := TPoint.Create;\n      FOrigin.Assign(aSource.FOrigin);\n    end;\n  end;"
    ));
    // Assign copies a present value and clears an absent one.
    assert!(unit.contains(
        "  if aSource.HasOrigin then\n  begin\n    Origin := TPoint.Create;\n    FOrigin.Assign(aSource.FOrigin);\n  end\n  else\n  begin\n    HasOrigin := False;\n  end;"
    ));
    assert!(unit.contains(
        "  if aSource.HasName then\n  begin\n    Name := aSource.Name;\n  end\n  else\n  begin\n    HasName := False;\n  end;"
    ));
    // Merging a oneof member goes through its setter, which moves the case.
    assert!(unit.contains("  if aSource.HasB then\n  begin\n    B := aSource.B;\n  end;"));

    // Decoding a message creates the instance before reading into it.
    assert!(unit.contains(
        "  if HasUnparsedField(PROTOBUF_FIELD_NUMBER_C) then\n  begin\n    C := TPoint.Create;\n    FC.DecodeAsUnknownSingularField(Self, PROTOBUF_FIELD_NUMBER_C);\n  end\n  else\n  begin\n    HasC := False;\n  end;"
    ));
    assert!(unit.contains(
        "  if HasUnparsedField(PROTOBUF_FIELD_NUMBER_B) then\n  begin\n    B := gProtobufWireCodecInt32.DecodeUnknownField(Self, PROTOBUF_FIELD_NUMBER_B);\n  end\n  else\n  begin\n    HasB := False;\n  end;"
    ));

    // Assigning nil to a message member clears the oneof.
    assert!(unit.contains(
        "procedure TShape.SetC(aValue: TPoint);\nbegin\n  if aValue = nil then\n  begin\n    HasC := False;\n  end\n  else if aValue <> FC then\n  begin\n    HasC := True;\n    FC.Free;\n    FC := aValue;\n  end;\nend;"
    ));
}

#[test]
fn proto3_optional_field_has_explicit_presence() {
    let mut opt = message(
        "Opt",
        vec![
            optional(field("x", 1, Type::Int32), 0),
            field("y", 2, Type::Int32),
        ],
    );
    opt.oneof_decl.push(OneofDescriptorProto {
        name: Some("_x".to_string()),
        ..Default::default()
    });
    let request = CodeGeneratorRequest {
        file_to_generate: vec!["opt.proto".to_string()],
        proto_file: vec![FileDescriptorProto {
            name: Some("opt.proto".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![opt],
            ..Default::default()
        }],
        ..Default::default()
    };

    let response = plugin::respond(&request);
    assert_eq!(response.error, None);
    let unit = response.file[0].content();

    assert!(unit.contains("property X: Int32 read GetX write SetX;"));
    assert!(unit.contains("property HasX: Boolean read GetHasX write SetHasX;"));
    assert!(unit.contains("of type <c>optional int32</c>"));
    assert!(unit.contains("XPresenceCaseNone = 0,"));
    assert!(unit.contains("XPresenceCaseX = 1"));
    assert!(unit.contains("property XPresence: TXPresenceCase read GetXPresence write SetXPresence;"));
    assert!(unit.contains(
        "function TOpt.GetHasX: Boolean;\nbegin\n  Result := (FXPresence = TXPresenceCase.XPresenceCaseX);\nend;"
    ));
    assert!(unit.contains("procedure TOpt.SetX(aValue: Int32);\nbegin\n  HasX := True;\n  FX := aValue;\nend;"));

    // A default value is still written once assigned; the plain field is not.
    assert!(unit.contains(
        "  if HasX then\n  begin\n    gProtobufWireCodecInt32.EncodeField(FX, PROTOBUF_FIELD_NUMBER_X, aDest);\n  end;"
    ));
    assert!(unit.contains(
        "  gProtobufWireCodecInt32.EncodeSingularField(FY, PROTOBUF_FIELD_NUMBER_Y, aDest);"
    ));
}

#[test]
fn case_only_differences_between_prefixed_names_get_suffixes() {
    let file = FileDescriptorProto {
        name: Some("pairs.proto".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![message(
            "Pairs",
            vec![
                field("x", 1, Type::Int32),
                field("fx", 2, Type::Int32),
                field("h", 3, Type::Int32),
                field("hash", 4, Type::Int32),
            ],
        )],
        ..Default::default()
    };
    let units = plugin::generate(&[file], &["pairs.proto".to_string()], &Options::default()).unwrap();
    let unit = &units[0].content;

    assert!(unit.contains("FX: Int32;"));
    assert!(unit.contains("FFx: Int32;"));
    assert!(unit.contains("property Fx_: Int32 read GetFx write SetFx;"));
    assert!(unit.contains("property HasH: Boolean read GetHasH write SetHasH;"));
    assert!(unit.contains("property Hash_: Int32 read GetHash_ write SetHash_;"));
    assert!(unit.contains("property HasHash: Boolean read GetHasHash write SetHasHash;"));
}

#[test]
fn single_field_unit_renders_exactly() {
    let flag = FileDescriptorProto {
        name: Some("flag.proto".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![message("Flag", vec![field("enabled", 1, Type::Bool)])],
        ..Default::default()
    };
    let units = plugin::generate(&[flag], &["flag.proto".to_string()], &Options::default()).unwrap();
    assert_eq!(units[0].path, "uFlag.pas");
    assert_eq!(
        units[0].content,
        r#"// Generated by protoc-gen-delphi from flag.proto.
// Do not edit.

unit uFlag;

{$SCOPEDENUMS ON}

interface

uses
  Classes,
  Protobuf.Delphi.uProtobuf,
  Protobuf.Delphi.uProtobufMessage,
  Protobuf.Delphi.uProtobufBool;

type
  TFlag = class;

  /// <summary>
  /// Protobuf message <c>Flag</c>.
  /// </summary>
  TFlag = class(TProtobufMessage)
  public
    const
      PROTOBUF_FIELD_NUMBER_ENABLED = 1;
      PROTOBUF_FIELD_NAME_ENABLED = 'enabled';
  private
    var
      FEnabled: Boolean;
  protected
    function GetEnabled: Boolean; virtual;
    procedure SetEnabled(aValue: Boolean); virtual;
    function GetHasEnabled: Boolean; virtual;
    procedure SetHasEnabled(aValue: Boolean); virtual;
  public
    /// <summary>
    /// Protobuf field <c>enabled = 1</c> of type <c>bool</c>.
    /// </summary>
    property Enabled: Boolean read GetEnabled write SetEnabled;
    /// <summary>
    /// Whether <c>enabled</c> differs from its default value. Setting <c>False</c> resets it; setting <c>True</c> on an absent field raises <c>EProtobufInvalidOperation</c>.
    /// </summary>
    property HasEnabled: Boolean read GetHasEnabled write SetHasEnabled;
    constructor Create; override;
    destructor Destroy; override;
    procedure Clear; override;
    procedure Encode(aDest: TStream); override;
    procedure Decode(aSource: TStream); override;
    procedure MergeFrom(aSource: TProtobufMessage); override;
    procedure Assign(aSource: TPersistent); override;
  private
    procedure ClearOwnFields;
    procedure MergeFromOwnFields(aSource: TFlag);
    procedure AssignOwnFields(aSource: TFlag);
  end;

implementation

function TFlag.GetEnabled: Boolean;
begin
  Result := FEnabled;
end;

procedure TFlag.SetEnabled(aValue: Boolean);
begin
  FEnabled := aValue;
end;

function TFlag.GetHasEnabled: Boolean;
begin
  Result := (FEnabled <> False);
end;

procedure TFlag.SetHasEnabled(aValue: Boolean);
begin
  if aValue then
  begin
    if not HasEnabled then
    begin
      raise EProtobufInvalidOperation.Create('Cannot mark field enabled as present without assigning a value');
    end;
  end
  else
  begin
    FEnabled := False;
  end;
end;

constructor TFlag.Create;
begin
  inherited Create;
  ClearOwnFields;
end;

destructor TFlag.Destroy;
begin
  inherited Destroy;
end;

procedure TFlag.Clear;
begin
  inherited Clear;
  ClearOwnFields;
end;

procedure TFlag.Encode(aDest: TStream);
begin
  inherited Encode(aDest);
  gProtobufWireCodecBool.EncodeSingularField(FEnabled, PROTOBUF_FIELD_NUMBER_ENABLED, aDest);
end;

procedure TFlag.Decode(aSource: TStream);
begin
  inherited Decode(aSource);
  if HasUnparsedField(PROTOBUF_FIELD_NUMBER_ENABLED) then
  begin
    Enabled := gProtobufWireCodecBool.DecodeUnknownField(Self, PROTOBUF_FIELD_NUMBER_ENABLED);
  end
  else
  begin
    HasEnabled := False;
  end;
end;

procedure TFlag.MergeFrom(aSource: TProtobufMessage);
var
  lSource: TFlag;
begin
  lSource := aSource as TFlag;
  inherited MergeFrom(aSource);
  MergeFromOwnFields(lSource);
end;

procedure TFlag.Assign(aSource: TPersistent);
var
  lSource: TFlag;
begin
  lSource := aSource as TFlag;
  inherited Assign(aSource);
  AssignOwnFields(lSource);
end;

procedure TFlag.ClearOwnFields;
begin
  HasEnabled := False;
end;

procedure TFlag.MergeFromOwnFields(aSource: TFlag);
begin
  if aSource.HasEnabled then
  begin
    Enabled := aSource.Enabled;
  end;
end;

procedure TFlag.AssignOwnFields(aSource: TFlag);
begin
  if aSource.HasEnabled then
  begin
    Enabled := aSource.Enabled;
  end
  else
  begin
    HasEnabled := False;
  end;
end;

end.
"#
    );
}

#[test]
fn colliding_field_names_get_suffixes() {
    let file = FileDescriptorProto {
        name: Some("clash.proto".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![message(
            "Clash",
            vec![
                field("x", 1, Type::Int32),
                field("has_x", 2, Type::Bool),
                field("clear", 3, Type::Bool),
                field("type", 4, Type::String),
            ],
        )],
        ..Default::default()
    };
    let units = plugin::generate(&[file], &["clash.proto".to_string()], &Options::default()).unwrap();
    let unit = &units[0].content;

    assert!(unit.contains("property HasX: Boolean read GetHasX write SetHasX;"));
    assert!(unit.contains("property HasX_: Boolean read GetHasX_ write SetHasX_;"));
    assert!(unit.contains("property HasHasX: Boolean"));
    assert!(unit.contains("property Clear_: Boolean"));
    assert!(unit.contains("property Type_: UnicodeString"));
    assert!(unit.contains("PROTOBUF_FIELD_NUMBER_HAS_X = 2;"));
}

#[test]
fn deterministic_output() {
    let dir_a = tempdir();
    let dir_b = tempdir();

    plugin::write_units(&dir_a, &generate_all()).unwrap();
    plugin::write_units(&dir_b, &generate_all()).unwrap();

    // Compare all generated files byte-for-byte.
    for entry in walkdir(&dir_a) {
        let relative = entry.strip_prefix(&dir_a).unwrap();
        let file_a = std::fs::read_to_string(&entry).unwrap();
        let file_b = std::fs::read_to_string(dir_b.join(relative)).unwrap();
        assert_eq!(file_a, file_b, "files differ: {}", relative.display());
    }
}

#[test]
fn plugin_envelope_round_trip() {
    let request = CodeGeneratorRequest {
        file_to_generate: vec!["demo/shapes.proto".to_string()],
        parameter: Some("runtime_namespace=Acme.Protobuf".to_string()),
        proto_file: vec![color_file(), shapes_file()],
        ..Default::default()
    };

    let mut output = Vec::new();
    plugin::run_plugin(request.encode_to_vec().as_slice(), &mut output).unwrap();
    let response = CodeGeneratorResponse::decode(output.as_slice()).unwrap();

    assert_eq!(response.error, None);
    assert_eq!(response.file.len(), 1);
    assert_eq!(response.file[0].name(), "Demo/Shapes/Demo.Shapes.uShapes.pas");
    let content = response.file[0].content();
    assert!(content.contains("  Acme.Protobuf.uProtobufMessage,\n"));
    assert!(content.contains("Acme.Protobuf.uProtobufRepeatedField"));
    assert!(!content.contains("Protobuf.Delphi."));
}

#[test]
fn missing_import_aborts_request() {
    let request = CodeGeneratorRequest {
        file_to_generate: vec!["demo/shapes.proto".to_string()],
        proto_file: vec![shapes_file()],
        ..Default::default()
    };
    let response = plugin::respond(&request);

    assert!(response.file.is_empty());
    assert!(response.error().contains("common/color.proto"));
    assert!(response.error().contains("not found"));
}

#[test]
fn unknown_option_aborts_request() {
    let request = CodeGeneratorRequest {
        file_to_generate: vec!["common/color.proto".to_string()],
        parameter: Some("runtime_namespace=X,emit_json=true".to_string()),
        proto_file: vec![color_file()],
        ..Default::default()
    };
    let response = plugin::respond(&request);

    assert!(response.file.is_empty());
    assert_eq!(response.error(), "unimplemented generation option 'emit_json'");
}

#[test]
fn unsupported_field_type_is_reported() {
    let mut file = color_file();
    file.message_type.push(message(
        "Legacy",
        vec![typed("grp", 1, Type::Group, ".demo.common.Legacy.Grp")],
    ));
    let err = plugin::generate(&[file], &["common/color.proto".to_string()], &Options::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnimplementedFieldType { .. }));
    assert!(err.to_string().contains("Legacy.grp"));
}

#[test]
fn descriptor_set_load_from_file() {
    let dir = tempdir();
    let path = dir.join("schema.pb");

    let set = FileDescriptorSet {
        file: vec![color_file(), shapes_file()],
    };
    std::fs::write(&path, set.encode_to_vec()).unwrap();

    let loaded = protoc_gen_delphi::schema::load_descriptor_set(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].name(), "demo/shapes.proto");

    let missing = protoc_gen_delphi::schema::load_descriptor_set(&dir.join("absent.pb"));
    assert!(matches!(missing, Err(Error::Read { .. })));
}

// ── Helpers ────────────────────────────────────────────────────────────

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, ty)
    }
}

fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

fn in_oneof(mut field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    field.oneof_index = Some(index);
    field
}

fn optional(field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        proto3_optional: Some(true),
        ..in_oneof(field, index)
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some(name.to_string()),
                number: Some(*number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn tempdir() -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "protoc-gen-delphi-test-{}-{}",
        std::process::id(),
        id
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn walkdir(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    fn walk(dir: &Path, files: &mut Vec<std::path::PathBuf>) {
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, files);
                } else {
                    files.push(path);
                }
            }
        }
    }
    walk(dir, &mut files);
    files.sort();
    files
}
