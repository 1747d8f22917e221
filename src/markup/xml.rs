//! Conversion between `MarkupNode` trees and XML text.

use super::MarkupNode;
use crate::error::{PluginError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

fn markup_err(err: impl std::fmt::Display) -> PluginError {
    PluginError::Markup(err.to_string())
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(markup_err)
}

fn element_from(start: &BytesStart<'_>) -> Result<MarkupNode> {
    let mut node = MarkupNode::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(markup_err)?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value().map_err(markup_err)?;
        node.set_attr(key, value);
    }
    Ok(node)
}

fn attach(
    stack: &mut [MarkupNode],
    root: &mut Option<MarkupNode>,
    node: MarkupNode,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children_mut().push(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(PluginError::Parse(
            "document has more than one root element".to_string(),
        )),
    }
}

pub(super) fn parse_document(input: &str) -> Result<MarkupNode> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<MarkupNode> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(markup_err)? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let node = element_from(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let mut node = stack
                    .pop()
                    .ok_or_else(|| PluginError::Parse("unbalanced end tag".to_string()))?;
                if !node.children().is_empty() && node.text().trim().is_empty() {
                    node.text_mut().clear();
                }
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let text = text.unescape().map_err(markup_err)?;
                    top.text_mut().push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    let text = utf8(&data.into_inner())?;
                    top.text_mut().push_str(&text);
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(PluginError::Parse("unclosed element".to_string()));
    }
    root.ok_or_else(|| PluginError::Parse("document has no root element".to_string()))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &MarkupNode) -> Result<()> {
    let mut start = BytesStart::new(node.name());
    for (key, value) in node.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children().is_empty() && node.text().is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(markup_err);
    }

    writer.write_event(Event::Start(start)).map_err(markup_err)?;
    if !node.text().is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(node.text())))
            .map_err(markup_err)?;
    }
    for child in node.children() {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name())))
        .map_err(markup_err)
}

pub(super) fn write_document(root: &MarkupNode, with_declaration: bool) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    if with_declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(markup_err)?;
    }
    write_node(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(markup_err)
}
