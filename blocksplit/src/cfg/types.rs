use super::dupath::DuPaths;

/// One node of a function's control-flow graph.
///
/// A node is either a real block (unique `id`, rendered code fragments,
/// successor edges) or an anonymous container (`id == None`) that only
/// groups the child nodes of a branch. Containers never carry edges.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    /// Unique id within the function graph; `None` for branch containers.
    pub id: Option<usize>,
    /// Rendered source fragments of the block, top to bottom.
    pub code: Vec<String>,
    /// Ids of the nodes control may transfer to next.
    pub successors: Vec<usize>,
    /// Nested nodes owned by this one (branch bodies, loop bodies).
    pub children: Vec<FlowNode>,
    /// Variable names this block writes.
    pub defines: Vec<String>,
    /// Variable names this block reads.
    pub uses: Vec<String>,
    /// Marks the unique entry node.
    pub is_entry: bool,
    /// Marks the unique exit node.
    pub is_exit: bool,
    /// 1-indexed source lines covered by this block's fragments.
    pub line_numbers: Vec<usize>,
}

impl FlowNode {
    /// A real node with the given id and no content yet.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id: Some(id),
            code: Vec::new(),
            successors: Vec::new(),
            children: Vec::new(),
            defines: Vec::new(),
            uses: Vec::new(),
            is_entry: false,
            is_exit: false,
            line_numbers: Vec::new(),
        }
    }

    /// An anonymous grouping container (no id, no edges).
    #[must_use]
    pub fn container() -> Self {
        Self {
            id: None,
            code: Vec::new(),
            successors: Vec::new(),
            children: Vec::new(),
            defines: Vec::new(),
            uses: Vec::new(),
            is_entry: false,
            is_exit: false,
            line_numbers: Vec::new(),
        }
    }

    /// First line covered by this node, if any.
    #[must_use]
    pub fn first_line(&self) -> Option<usize> {
        self.line_numbers.first().copied()
    }
}

/// The control-flow graph and definition-use index of one function.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowGraph {
    /// Name of the analyzed function.
    pub name: String,
    /// Entry node; the rest of the graph hangs off its children.
    pub root: FlowNode,
    /// Per-variable definition/use sequences.
    pub du: DuPaths,
}
