//! Live, user-editable visual structure of a rule.
//!
//! The tree is an arena of blocks laid out in two areas (conditions and
//! actions). Group blocks own a nested children container. Handles are only
//! valid for the render generation that produced them.

use std::collections::BTreeMap;
use std::fmt;

/// Handle to a block in a [`VisualTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    generation: u32,
    index: usize,
}

/// Declared kind of a block. Extraction only understands the first four.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Condition,
    Group,
    Action,
    /// Marker shown in an empty group container.
    Placeholder,
    Unrecognized(String),
}

impl BlockKind {
    pub fn tag(&self) -> &str {
        match self {
            BlockKind::Condition => "condition",
            BlockKind::Group => "group",
            BlockKind::Action => "action",
            BlockKind::Placeholder => "placeholder",
            BlockKind::Unrecognized(tag) => tag,
        }
    }
}

/// Editable control bound to a model attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
    Field,
    Operator,
    Value,
    Type,
    Severity,
    Channel,
    MessageTemplate,
}

impl Control {
    pub fn as_str(&self) -> &'static str {
        match self {
            Control::Field => "field",
            Control::Operator => "operator",
            Control::Value => "value",
            Control::Type => "type",
            Control::Severity => "severity",
            Control::Channel => "channel",
            Control::MessageTemplate => "message_template",
        }
    }
}

/// Current value of a control. Selects carry their options; free-text inputs carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub value: String,
    pub options: Vec<String>,
}

/// The two independently sortable regions of the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Conditions,
    Actions,
}

/// Ordered list of blocks: an area, or the children container of a group block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Area(Area),
    Group(BlockId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    label: String,
    controls: BTreeMap<Control, ControlState>,
    children: Vec<BlockId>,
    parent: Option<Container>,
    accepts_children: bool,
}

impl Block {
    pub fn new(kind: BlockKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            controls: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            accepts_children: false,
        }
    }

    pub fn with_select<I, S>(mut self, control: Control, value: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.controls.insert(
            control,
            ControlState {
                value: value.into(),
                options: options.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn with_input(mut self, control: Control, value: impl Into<String>) -> Self {
        self.controls.insert(
            control,
            ControlState {
                value: value.into(),
                options: Vec::new(),
            },
        );
        self
    }

    /// Shows the "add condition" affordance on a group block.
    pub fn accepting_children(mut self, accepts: bool) -> Self {
        self.accepts_children = accepts;
        self
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn control(&self, control: Control) -> Option<&str> {
        self.controls.get(&control).map(|state| state.value.as_str())
    }

    pub fn options(&self, control: Control) -> Option<&[String]> {
        self.controls.get(&control).map(|state| state.options.as_slice())
    }

    pub fn children(&self) -> &[BlockId] {
        &self.children
    }

    pub fn parent(&self) -> Option<Container> {
        self.parent
    }

    pub fn accepts_children(&self) -> bool {
        self.accepts_children
    }

    pub(crate) fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub(crate) fn set_accepts_children(&mut self, accepts: bool) {
        self.accepts_children = accepts;
    }

    pub(crate) fn set_control_state(&mut self, control: Control, state: ControlState) {
        self.controls.insert(control, state);
    }

    pub(crate) fn remove_control(&mut self, control: Control) {
        self.controls.remove(&control);
    }
}

/// Arena holding the rendered blocks of one builder mount.
#[derive(Debug, Clone)]
pub struct VisualTree {
    mount: String,
    generation: u32,
    slots: Vec<Option<Block>>,
    conditions: Vec<BlockId>,
    actions: Vec<BlockId>,
}

impl VisualTree {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
            generation: 0,
            slots: Vec::new(),
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Drops every block and invalidates all handles issued so far.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.slots.clear();
        self.conditions.clear();
        self.actions.clear();
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        if id.generation != self.generation {
            return None;
        }
        self.slots.get(id.index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        if id.generation != self.generation {
            return None;
        }
        self.slots.get_mut(id.index).and_then(Option::as_mut)
    }

    /// Number of live blocks, placeholders included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks of `container` in visual order. Unknown containers are empty.
    pub fn children(&self, container: Container) -> &[BlockId] {
        match container {
            Container::Area(Area::Conditions) => &self.conditions,
            Container::Area(Area::Actions) => &self.actions,
            Container::Group(id) => match self.get(id) {
                Some(block) if block.kind == BlockKind::Group => &block.children,
                _ => &[],
            },
        }
    }

    fn children_mut(&mut self, container: Container) -> Option<&mut Vec<BlockId>> {
        match container {
            Container::Area(Area::Conditions) => Some(&mut self.conditions),
            Container::Area(Area::Actions) => Some(&mut self.actions),
            Container::Group(id) => match self.get_mut(id) {
                Some(block) if block.kind == BlockKind::Group => Some(&mut block.children),
                _ => None,
            },
        }
    }

    pub fn append(&mut self, container: Container, block: Block) -> Option<BlockId> {
        self.insert(container, usize::MAX, block)
    }

    /// Inserts `block` at `index` (clamped) in `container`.
    pub fn insert(&mut self, container: Container, index: usize, mut block: Block) -> Option<BlockId> {
        let id = BlockId {
            generation: self.generation,
            index: self.slots.len(),
        };
        let siblings = self.children_mut(container)?;
        let position = index.min(siblings.len());
        siblings.insert(position, id);

        block.parent = Some(container);
        block.children.clear();
        self.slots.push(Some(block));
        Some(id)
    }

    /// Detaches a block and drops its subtree.
    pub fn remove(&mut self, id: BlockId) -> bool {
        let Some(parent) = self.get(id).and_then(Block::parent) else {
            return false;
        };
        if let Some(siblings) = self.children_mut(parent) {
            siblings.retain(|sibling| *sibling != id);
        }
        self.drop_subtree(id);
        true
    }

    fn drop_subtree(&mut self, id: BlockId) {
        let children = match self.slots.get_mut(id.index).and_then(Option::take) {
            Some(block) => block.children,
            None => return,
        };
        for child in children {
            self.drop_subtree(child);
        }
    }

    /// Physically moves a block so it ends up at `index` (clamped) in `destination`.
    ///
    /// Conditions, groups and placeholders stay in condition containers,
    /// actions stay in the actions area, and a group never moves into its own subtree.
    pub fn move_block(&mut self, id: BlockId, destination: Container, index: usize) -> bool {
        let Some(block) = self.get(id) else {
            return false;
        };
        let Some(source) = block.parent else {
            return false;
        };

        let allowed = match (&block.kind, destination) {
            (BlockKind::Action, Container::Area(Area::Actions)) => true,
            (BlockKind::Action, _) => false,
            (BlockKind::Unrecognized(_), _) => true,
            (_, Container::Area(Area::Actions)) => false,
            _ => true,
        };
        if !allowed {
            return false;
        }

        if let Container::Group(target) = destination {
            match self.get(target) {
                Some(group) if group.kind == BlockKind::Group => {}
                _ => return false,
            }
            if self.is_within(target, id) {
                return false;
            }
        }

        if let Some(siblings) = self.children_mut(source) {
            siblings.retain(|sibling| *sibling != id);
        }
        let Some(siblings) = self.children_mut(destination) else {
            return false;
        };
        let position = index.min(siblings.len());
        siblings.insert(position, id);

        if let Some(block) = self.get_mut(id) {
            block.parent = Some(destination);
        }
        true
    }

    /// Whether `id` is `ancestor` or nested somewhere below it.
    fn is_within(&self, id: BlockId, ancestor: BlockId) -> bool {
        let mut current = Some(id);
        while let Some(block_id) = current {
            if block_id == ancestor {
                return true;
            }
            current = match self.get(block_id).and_then(Block::parent) {
                Some(Container::Group(parent)) => Some(parent),
                _ => None,
            };
        }
        false
    }

    /// Sets a control value. Select controls only take one of their options.
    pub fn set_control(&mut self, id: BlockId, control: Control, value: impl Into<String>) -> bool {
        let value = value.into();
        let Some(state) = self
            .get_mut(id)
            .and_then(|block| block.controls.get_mut(&control))
        else {
            return false;
        };
        if !state.options.is_empty() && !state.options.contains(&value) {
            return false;
        }
        state.value = value;
        true
    }

    /// Removes placeholder blocks from a group's children container.
    pub fn clear_placeholders(&mut self, group: BlockId) {
        let placeholders: Vec<BlockId> = self
            .children(Container::Group(group))
            .iter()
            .copied()
            .filter(|child| {
                self.get(*child)
                    .is_some_and(|block| block.kind == BlockKind::Placeholder)
            })
            .collect();
        for placeholder in placeholders {
            self.remove(placeholder);
        }
    }

    /// Every block below `container`, parents before their children.
    pub fn descendants(&self, container: Container) -> Vec<BlockId> {
        let mut found = Vec::new();
        for id in self.children(container) {
            found.push(*id);
            found.extend(self.descendants(Container::Group(*id)));
        }
        found
    }

    /// Finds a block by position: first index in the area, then within nested groups.
    pub fn block_at(&self, area: Area, path: &[usize]) -> Option<BlockId> {
        let (first, rest) = path.split_first()?;
        let mut current = *self.children(Container::Area(area)).get(*first)?;
        for index in rest {
            current = *self.children(Container::Group(current)).get(*index)?;
        }
        Some(current)
    }

    /// The area a block lives in, following group parents upwards.
    pub fn area_of(&self, id: BlockId) -> Option<Area> {
        let mut current = id;
        loop {
            match self.get(current)?.parent? {
                Container::Area(area) => return Some(area),
                Container::Group(parent) => current = parent,
            }
        }
    }

    fn write_container(&self, f: &mut fmt::Formatter<'_>, container: Container, depth: usize) -> fmt::Result {
        for id in self.children(container) {
            let Some(block) = self.get(*id) else {
                continue;
            };
            let indent = "  ".repeat(depth);
            let affordance = if block.accepts_children { " [+ condition]" } else { "" };
            writeln!(f, "{}[{}] {}{}", indent, block.kind.tag(), block.label, affordance)?;
            if block.kind == BlockKind::Group {
                self.write_container(f, Container::Group(*id), depth + 1)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for VisualTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.mount)?;
        writeln!(f, "conditions:")?;
        self.write_container(f, Container::Area(Area::Conditions), 1)?;
        writeln!(f, "actions:")?;
        self.write_container(f, Container::Area(Area::Actions), 1)
    }
}
