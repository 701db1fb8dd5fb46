/*
 * engine/input.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Accepted input shapes for the engine's entry point.
 */

use serde_json::Value;

use crate::block::{CodeBlock, CodeBlockDescriptor};
use crate::error::{CodeBlockError, Result};

/// One input block: plain data or a pre-built instance.
#[derive(Debug, Clone)]
pub enum BlockInput {
    Descriptor(CodeBlockDescriptor),
    Block(CodeBlock),
}

impl BlockInput {
    fn into_block(self) -> CodeBlock {
        match self {
            BlockInput::Descriptor(descriptor) => CodeBlock::from_descriptor(descriptor),
            BlockInput::Block(block) => block,
        }
    }
}

impl From<CodeBlockDescriptor> for BlockInput {
    fn from(descriptor: CodeBlockDescriptor) -> Self {
        BlockInput::Descriptor(descriptor)
    }
}

impl From<CodeBlock> for BlockInput {
    fn from(block: CodeBlock) -> Self {
        BlockInput::Block(block)
    }
}

/// The ordered blocks of one `process()` call.
///
/// Built from a single descriptor or block, a `Vec` of either, or untyped
/// JSON through [`ProcessInput::from_json`].
#[derive(Debug, Clone, Default)]
pub struct ProcessInput {
    blocks: Vec<BlockInput>,
}

impl ProcessInput {
    pub fn new(blocks: Vec<BlockInput>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Validate untyped input: a descriptor object or an array of them.
    ///
    /// Each descriptor needs string `code`, `language` and `meta` fields;
    /// `locale` and `parentDocument` are optional.
    pub fn from_json(value: &Value) -> Result<Self> {
        let items: Vec<&Value> = match value {
            Value::Object(_) => vec![value],
            Value::Array(items) => items.iter().collect(),
            other => {
                return Err(CodeBlockError::validation(format!(
                    "expected a code block descriptor or an array of descriptors, got {}",
                    json_type_name(other)
                )));
            }
        };

        let blocks = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| descriptor_from_json(index, item).map(BlockInput::Descriptor))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { blocks })
    }

    /// Convert every entry into a block. An empty input is rejected.
    pub(crate) fn into_blocks(self) -> Result<Vec<CodeBlock>> {
        if self.blocks.is_empty() {
            return Err(CodeBlockError::validation(
                "at least one code block is required",
            ));
        }
        Ok(self.blocks.into_iter().map(BlockInput::into_block).collect())
    }
}

fn descriptor_from_json(index: usize, item: &Value) -> Result<CodeBlockDescriptor> {
    let Value::Object(fields) = item else {
        return Err(CodeBlockError::validation(format!(
            "entry {} must be an object, got {}",
            index,
            json_type_name(item)
        )));
    };
    for field in ["code", "language", "meta"] {
        match fields.get(field) {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(CodeBlockError::validation(format!(
                    "entry {}: field '{}' must be a string, got {}",
                    index,
                    field,
                    json_type_name(other)
                )));
            }
            None => {
                return Err(CodeBlockError::validation(format!(
                    "entry {}: missing required field '{}'",
                    index, field
                )));
            }
        }
    }
    serde_json::from_value(item.clone())
        .map_err(|e| CodeBlockError::validation(format!("entry {}: {}", index, e)))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl From<CodeBlockDescriptor> for ProcessInput {
    fn from(descriptor: CodeBlockDescriptor) -> Self {
        Self::new(vec![descriptor.into()])
    }
}

impl From<CodeBlock> for ProcessInput {
    fn from(block: CodeBlock) -> Self {
        Self::new(vec![block.into()])
    }
}

impl From<BlockInput> for ProcessInput {
    fn from(input: BlockInput) -> Self {
        Self::new(vec![input])
    }
}

impl From<Vec<CodeBlockDescriptor>> for ProcessInput {
    fn from(descriptors: Vec<CodeBlockDescriptor>) -> Self {
        Self::new(descriptors.into_iter().map(BlockInput::from).collect())
    }
}

impl From<Vec<CodeBlock>> for ProcessInput {
    fn from(blocks: Vec<CodeBlock>) -> Self {
        Self::new(blocks.into_iter().map(BlockInput::from).collect())
    }
}

impl From<Vec<BlockInput>> for ProcessInput {
    fn from(blocks: Vec<BlockInput>) -> Self {
        Self::new(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_object_and_array() {
        let one = ProcessInput::from_json(&json!({"code": "x", "language": "js", "meta": ""}));
        assert_eq!(one.unwrap().len(), 1);

        let many = ProcessInput::from_json(&json!([
            {"code": "a", "language": "js", "meta": ""},
            {"code": "b", "language": "py", "meta": "title=\"b.py\"", "locale": "de"}
        ]))
        .unwrap();
        let blocks = many.into_blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].locale(), Some("de"));
    }

    #[test]
    fn test_parent_document_is_read() {
        let input = ProcessInput::from_json(&json!({
            "code": "x", "language": "js", "meta": "",
            "parentDocument": {
                "sourceFilePath": "index.md",
                "position": {"groupIndex": 2, "totalGroups": 5}
            }
        }))
        .unwrap();
        let blocks = input.into_blocks().unwrap();
        assert_eq!(blocks[0].group_index(), Some(2));
    }

    #[test]
    fn test_rejects_non_object_input() {
        for value in [json!("code"), json!(42), json!(null), json!([1, 2])] {
            let err = ProcessInput::from_json(&value).unwrap_err();
            assert!(matches!(err, CodeBlockError::Validation(_)), "{:?}", value);
        }
    }

    #[test]
    fn test_rejects_missing_or_mistyped_fields() {
        let err = ProcessInput::from_json(&json!({"code": "x", "language": "js"})).unwrap_err();
        assert!(err.to_string().contains("'meta'"));

        let err =
            ProcessInput::from_json(&json!({"code": 1, "language": "js", "meta": ""})).unwrap_err();
        assert!(err.to_string().contains("must be a string"));

        let err = ProcessInput::from_json(&json!({
            "code": "x", "language": "js", "meta": "", "locale": 5
        }))
        .unwrap_err();
        assert!(matches!(err, CodeBlockError::Validation(_)));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = ProcessInput::from(Vec::<CodeBlock>::new())
            .into_blocks()
            .unwrap_err();
        assert!(matches!(err, CodeBlockError::Validation(_)));
        assert!(ProcessInput::from_json(&json!([])).unwrap().is_empty());
    }
}
