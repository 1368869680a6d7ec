use itemgraph_core::{
    ChildListProp, ChildSlotProp, Context, ContextConfig, IdProp, ItemId, ReferenceProp,
    ScalarProp, Template, TemplateRegistry,
};

/// Property descriptors of the `Node` test type
#[allow(dead_code)]
pub struct Node {
    pub id: IdProp,
    pub x: ScalarProp,
    pub array: ChildListProp,
    pub child: ChildSlotProp,
    pub reference: ReferenceProp,
}

/// Property descriptors of the `Leaf` test type
#[allow(dead_code)]
pub struct Leaf {
    pub name: ScalarProp,
    pub target: ReferenceProp,
}

fn registry() -> (TemplateRegistry, Node, Leaf) {
    let mut builder = Template::builder("Node");
    let node = Node {
        id: builder.id("id"),
        x: builder.scalar("x"),
        array: builder.child_list("array"),
        child: builder.child_slot("child"),
        reference: builder.reference("reference"),
    };
    let mut registry = TemplateRegistry::new();
    registry.register(builder.build()).unwrap();

    let mut builder = Template::builder("Leaf");
    let leaf = Leaf {
        name: builder.scalar("name"),
        target: builder.reference("target"),
    };
    registry.register(builder.build()).unwrap();

    (registry, node, leaf)
}

/// Context rooted at a `Node`, with default configuration
#[allow(dead_code)]
pub fn new_context() -> (Context, Node) {
    let (registry, node, _) = registry();
    (Context::new(registry, "Node").unwrap(), node)
}

/// Context rooted at a `Node`, with the given configuration
#[allow(dead_code)]
pub fn new_context_with(config: ContextConfig) -> (Context, Node) {
    let (registry, node, _) = registry();
    (Context::with_config(registry, "Node", config).unwrap(), node)
}

/// Context plus descriptors for both test types
#[allow(dead_code)]
pub fn new_context_with_leaf() -> (Context, Node, Leaf) {
    let (registry, node, leaf) = registry();
    (Context::new(registry, "Node").unwrap(), node, leaf)
}

/// Construct a `Node` and append it to `owner`, outside any transaction
#[allow(dead_code)]
pub fn add_node(ctx: &mut Context, node: &Node, owner: ItemId) -> ItemId {
    let item = ctx.construct("Node").unwrap();
    node.array.append(ctx, owner, item).unwrap();
    item
}

/// Child ids of `owner.array`, in order
#[allow(dead_code)]
pub fn children(ctx: &Context, node: &Node, owner: ItemId) -> Vec<ItemId> {
    node.array.get(ctx, owner).unwrap().to_vec()
}
