//! Template definition parser.
//!
//! Definitions are small XML documents:
//!
//! ```text
//! <template>
//!   <name>Simple</name>
//!   <duration>intrinsic</duration>            (optional)
//!   <properties>
//!     <property>
//!       <variable>clock_format</variable>
//!       <name>Clock format</name>
//!       <type>string</type>
//!       <default>H:mm</default>               (optional)
//!     </property>
//!     <group><name>...</name><property>...</property></group>
//!     <advanced> ... </advanced>              (at most once)
//!   </properties>
//!   <page> ...skeleton with {{ variable }} holes... </page>
//! </template>
//! ```
//!
//! Unknown tags and duplicate `<advanced>` blocks are structural errors, as
//! are property variables duplicated anywhere in the template.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::error::CoreError;
use crate::template::properties::{PropertyEntry, TemplateProperties};
use crate::template::property::{PropertyType, TemplateProperty, TemplatePropertyGroup};

pub(crate) struct ParsedDefinition {
    pub name: String,
    pub intrinsic_duration: bool,
    pub properties: TemplateProperties,
    pub skeleton: String,
}

pub(crate) fn parse_definition(xml: &str) -> Result<ParsedDefinition, CoreError> {
    let mut reader = Reader::from_str(xml);

    let mut in_template = false;
    let mut name = None;
    let mut duration = None;
    let mut properties = None;
    let mut skeleton = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if !in_template => {
                if e.name().as_ref() == b"template" {
                    in_template = true;
                } else {
                    return Err(structural(
                        &reader,
                        &format!("root element must be <template>, found <{}>", tag_name(&e)),
                    ));
                }
            }
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"name" => name = Some(leaf_text(&mut reader, e.name())?.trim().to_string()),
                b"duration" => {
                    duration = Some(leaf_text(&mut reader, e.name())?.trim().to_string());
                }
                b"properties" => properties = Some(parse_properties(&mut reader)?),
                // The skeleton is kept as raw markup, holes and all.
                b"page" => skeleton = Some(raw_text(&mut reader, e.name())?),
                _ => {
                    return Err(structural(
                        &reader,
                        &format!("invalid tag <{}> in <template>", tag_name(&e)),
                    ));
                }
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"template" => break,
            Ok(Event::Eof) => {
                return Err(structural(&reader, "unexpected end of template definition"));
            }
            Ok(_) => {}
            Err(e) => return Err(parse_error(&reader, &e)),
        }
    }

    let name =
        name.ok_or_else(|| structural(&reader, "template definition is missing <name>"))?;
    let properties = properties
        .ok_or_else(|| structural(&reader, "template definition is missing <properties>"))?;
    let skeleton =
        skeleton.ok_or_else(|| structural(&reader, "template definition is missing <page>"))?;

    properties.ensure_unique_variables()?;

    Ok(ParsedDefinition {
        name,
        intrinsic_duration: duration.as_deref() == Some("intrinsic"),
        properties,
        skeleton,
    })
}

fn parse_properties(reader: &mut Reader<&str>) -> Result<TemplateProperties, CoreError> {
    let mut root = Vec::new();
    let mut advanced: Option<Vec<PropertyEntry>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"property" => root.push(PropertyEntry::Property(parse_property(reader)?)),
                b"group" => root.push(PropertyEntry::Group(parse_group(reader)?)),
                b"advanced" => {
                    if advanced.is_some() {
                        return Err(structural(
                            reader,
                            "only one <advanced> block is allowed per template",
                        ));
                    }
                    advanced = Some(parse_entries(reader, b"advanced")?);
                }
                _ => {
                    return Err(structural(
                        reader,
                        &format!("invalid tag <{}> in <properties>", tag_name(&e)),
                    ));
                }
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"properties" => break,
            Ok(Event::Eof) => return Err(structural(reader, "unexpected end in <properties>")),
            Ok(_) => {}
            Err(e) => return Err(parse_error(reader, &e)),
        }
    }

    Ok(TemplateProperties {
        root,
        advanced: advanced.unwrap_or_default(),
    })
}

/// Parse a list of `<property>`/`<group>` entries up to the named end tag.
fn parse_entries(
    reader: &mut Reader<&str>,
    end: &[u8],
) -> Result<Vec<PropertyEntry>, CoreError> {
    let mut entries = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"property" => entries.push(PropertyEntry::Property(parse_property(reader)?)),
                b"group" => entries.push(PropertyEntry::Group(parse_group(reader)?)),
                _ => {
                    return Err(structural(
                        reader,
                        &format!("invalid tag <{}> in <advanced>", tag_name(&e)),
                    ));
                }
            },
            Ok(Event::End(e)) if e.name().as_ref() == end => break,
            Ok(Event::Eof) => return Err(structural(reader, "unexpected end in <advanced>")),
            Ok(_) => {}
            Err(e) => return Err(parse_error(reader, &e)),
        }
    }

    Ok(entries)
}

fn parse_group(reader: &mut Reader<&str>) -> Result<TemplatePropertyGroup, CoreError> {
    let mut name = None;
    let mut properties = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"name" => name = Some(leaf_text(reader, e.name())?.trim().to_string()),
                b"property" => properties.push(parse_property(reader)?),
                _ => {
                    return Err(structural(
                        reader,
                        &format!("invalid tag <{}> in <group>", tag_name(&e)),
                    ));
                }
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"group" => break,
            Ok(Event::Eof) => return Err(structural(reader, "unexpected end in <group>")),
            Ok(_) => {}
            Err(e) => return Err(parse_error(reader, &e)),
        }
    }

    Ok(TemplatePropertyGroup {
        name: name.ok_or_else(|| structural(reader, "<group> is missing <name>"))?,
        properties,
    })
}

fn parse_property(reader: &mut Reader<&str>) -> Result<TemplateProperty, CoreError> {
    let mut variable = None;
    let mut display_name = None;
    let mut type_name = None;
    let mut default = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"variable" => {
                    variable = Some(leaf_text(reader, e.name())?.trim().to_string());
                }
                b"name" => {
                    display_name = Some(leaf_text(reader, e.name())?.trim().to_string());
                }
                b"type" => type_name = Some(leaf_text(reader, e.name())?.trim().to_string()),
                b"default" => default = Some(leaf_text(reader, e.name())?),
                _ => {
                    return Err(structural(
                        reader,
                        &format!("invalid tag <{}> in <property>", tag_name(&e)),
                    ));
                }
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"default" => {
                default = Some(String::new());
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"property" => break,
            Ok(Event::Eof) => return Err(structural(reader, "unexpected end in <property>")),
            Ok(_) => {}
            Err(e) => return Err(parse_error(reader, &e)),
        }
    }

    let property_type = PropertyType::from_name(
        &type_name.ok_or_else(|| structural(reader, "<property> is missing <type>"))?,
    )?;

    // Raw defaults keep their whitespace verbatim; every other type trims.
    let default = default.map(|raw| {
        if property_type == PropertyType::Raw {
            raw
        } else {
            raw.trim().to_string()
        }
    });

    Ok(TemplateProperty {
        variable: variable
            .ok_or_else(|| structural(reader, "<property> is missing <variable>"))?,
        display_name: display_name
            .ok_or_else(|| structural(reader, "<property> is missing <name>"))?,
        property_type,
        default,
    })
}

/// Inner text of a leaf element, entities expanded.
fn leaf_text(reader: &mut Reader<&str>, end: QName) -> Result<String, CoreError> {
    let raw = raw_text(reader, end)?;
    let unescaped = quick_xml::escape::unescape(&raw)
        .map_err(|e| structural(reader, &format!("bad escape sequence: {e}")))?;
    Ok(unescaped.into_owned())
}

/// Inner content of an element as-is, nested markup included.
fn raw_text(reader: &mut Reader<&str>, end: QName) -> Result<String, CoreError> {
    let end = end.as_ref().to_vec();
    reader
        .read_text(QName(&end))
        .map(|cow| cow.into_owned())
        .map_err(|e| parse_error(reader, &e))
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn structural(reader: &Reader<&str>, msg: &str) -> CoreError {
    CoreError::TemplateDefinition(format!("{msg} (at byte {})", reader.buffer_position()))
}

fn parse_error(reader: &Reader<&str>, err: &quick_xml::Error) -> CoreError {
    CoreError::TemplateDefinition(format!(
        "XML parse error at byte {}: {err}",
        reader.buffer_position()
    ))
}
