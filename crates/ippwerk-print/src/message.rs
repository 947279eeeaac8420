// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP message model.
//
// A message is an ordered list of attribute groups.  Each group is one run
// of attributes that appeared under a single group-tag byte on the wire, so
// `[printer A][printer B]` stays two groups even though both carry the same
// tag.  That run boundary is the only thing that separates like entities in
// a Get-Jobs or Get-Printers style response.

use ippwerk_core::error::Result;
use ippwerk_core::types::IppVersion;

use crate::tag::{GroupTag, Operation, StatusCode, ValueTag};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// A named, tagged, ordered set of values.  More than one value is a 1setOf.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub tag: ValueTag,
    pub values: Vec<Value>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, tag: ValueTag, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            tag,
            values,
        }
    }

    /// First value, if any.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// All values as strings; fails on the first non-string value.
    pub fn strings(&self) -> Result<Vec<&str>> {
        self.values.iter().map(Value::as_str).collect()
    }
}

/// A run of attributes under one group-tag byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub tag: GroupTag,
    pub attributes: Vec<Attribute>,
}

/// Stable reference to an attribute returned by [`Message::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrHandle {
    pub group: usize,
    pub index: usize,
}

/// One entity found by [`Message::group_members`].
#[derive(Debug, Clone, Copy)]
pub struct GroupRun<'a> {
    /// Index of this run in [`Message::groups`].
    pub index: usize,
    pub attributes: &'a [Attribute],
    /// Where to resume the search for the next run.
    pub next: usize,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// An IPP request or response.
///
/// `code` is the operation id for requests and the status code for
/// responses; the wire format does not distinguish the two.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub version: IppVersion,
    pub code: u16,
    pub request_id: u32,
    pub groups: Vec<Group>,
}

impl Message {
    pub fn request(operation: Operation, request_id: u32) -> Self {
        Self {
            code: operation.as_u16(),
            request_id,
            ..Self::default()
        }
    }

    pub fn response(status: StatusCode, request_id: u32) -> Self {
        Self {
            code: status.0,
            request_id,
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: IppVersion) -> Self {
        self.version = version;
        self
    }

    pub fn operation(&self) -> Option<Operation> {
        Operation::from_u16(self.code)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode(self.code)
    }

    // -- Building -----------------------------------------------------------

    /// Start a new run of `tag` even if the last group already has that tag.
    pub fn begin_group(&mut self, tag: GroupTag) {
        self.groups.push(Group {
            tag,
            attributes: Vec::new(),
        });
    }

    /// Append a single-valued attribute.  It joins the last group when that
    /// group has the same tag; otherwise a new group starts.
    pub fn add(
        &mut self,
        group: GroupTag,
        tag: ValueTag,
        name: impl Into<String>,
        value: Value,
    ) -> AttrHandle {
        self.add_values(group, tag, name, vec![value])
    }

    pub fn add_values(
        &mut self,
        group: GroupTag,
        tag: ValueTag,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> AttrHandle {
        if self.groups.last().is_none_or(|g| g.tag != group) {
            self.begin_group(group);
        }
        let group_index = self.groups.len() - 1;
        let attributes = &mut self.groups[group_index].attributes;
        attributes.push(Attribute::new(name, tag, values));

        AttrHandle {
            group: group_index,
            index: attributes.len() - 1,
        }
    }

    /// Convenience for the many plain string attributes in a request.
    pub fn add_string(
        &mut self,
        group: GroupTag,
        tag: ValueTag,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> AttrHandle {
        self.add(group, tag, name, Value::String(value.into()))
    }

    pub fn add_strings<I, S>(
        &mut self,
        group: GroupTag,
        tag: ValueTag,
        name: impl Into<String>,
        values: I,
    ) -> AttrHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(|s| Value::String(s.into())).collect();
        self.add_values(group, tag, name, values)
    }

    pub fn attribute(&self, handle: AttrHandle) -> Option<&Attribute> {
        self.groups.get(handle.group)?.attributes.get(handle.index)
    }

    pub fn attribute_mut(&mut self, handle: AttrHandle) -> Option<&mut Attribute> {
        self.groups
            .get_mut(handle.group)?
            .attributes
            .get_mut(handle.index)
    }

    // -- Queries ------------------------------------------------------------

    /// Every attribute in wire order, with its group tag.
    pub fn attributes(&self) -> impl Iterator<Item = (GroupTag, &Attribute)> {
        self.groups
            .iter()
            .flat_map(|g| g.attributes.iter().map(move |a| (g.tag, a)))
    }

    /// First attribute named `name` carrying `tag`, in wire order.
    pub fn find(&self, name: &str, tag: ValueTag) -> Option<&Attribute> {
        self.attributes()
            .map(|(_, a)| a)
            .find(|a| a.name == name && a.tag == tag)
    }

    /// First attribute named `name` whatever its tag.
    pub fn find_any(&self, name: &str) -> Option<&Attribute> {
        self.attributes().map(|(_, a)| a).find(|a| a.name == name)
    }

    /// The first run of `tag` at or after group index `start`.
    pub fn group_members(&self, tag: GroupTag, start: usize) -> Option<GroupRun<'_>> {
        self.groups
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, g)| g.tag == tag)
            .map(|(index, g)| GroupRun {
                index,
                attributes: &g.attributes,
                next: index + 1,
            })
    }

    /// Every non-empty run of `tag`: one slice per entity.
    pub fn entities(&self, tag: GroupTag) -> Vec<&[Attribute]> {
        let mut runs = Vec::new();
        let mut start = 0;
        while let Some(run) = self.group_members(tag, start) {
            if !run.attributes.is_empty() {
                runs.push(run.attributes);
            }
            start = run.next;
        }
        runs
    }

    /// The response's `status-message`, if the printer sent one.
    pub fn status_message(&self) -> Option<&str> {
        self.find("status-message", ValueTag::Text)
            .and_then(Attribute::first)
            .and_then(|v| v.as_str().ok())
    }
}

/// Sequential request ids for one client session.
#[derive(Debug, Clone)]
pub struct RequestIds(u32);

impl RequestIds {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next_id(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(1).max(1);
        self.0
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}
