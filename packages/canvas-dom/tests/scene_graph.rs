use canvas_dom::{
    CanvasConfig, Content, Descriptor, Error, GraphicsContext, NodeId, RawDescriptor, attrs,
};
use canvas_svg::SvgDocument;
use canvas_traits::{HostHandle, HostSurface};

fn canvas(config: CanvasConfig) -> GraphicsContext<SvgDocument> {
    let document = SvgDocument::new();
    let container = document.root();
    let mut canvas = GraphicsContext::new(document, config);
    canvas.render(container);
    canvas
}

fn host(canvas: &GraphicsContext<SvgDocument>, id: NodeId) -> HostHandle {
    canvas.node(id).and_then(|node| node.host()).unwrap()
}

fn attr(canvas: &GraphicsContext<SvgDocument>, id: NodeId, name: &str) -> Option<String> {
    canvas.host().attribute(host(canvas, id), None, name)
}

fn host_children(canvas: &GraphicsContext<SvgDocument>, id: NodeId) -> Vec<HostHandle> {
    canvas.host().children(host(canvas, id))
}

fn rect(canvas: &mut GraphicsContext<SvgDocument>, x: i32) -> NodeId {
    canvas
        .add("rect", attrs! { "x" => x, "width" => 10, "height" => 10 }, Content::Empty)
        .unwrap()
        .unwrap()
}

#[test]
fn root_reflects_fixed_size() {
    let canvas = canvas(CanvasConfig::new(400.0, 300.0));
    let root = canvas.root();
    assert_eq!(attr(&canvas, root, "width").as_deref(), Some("400"));
    assert_eq!(attr(&canvas, root, "height").as_deref(), Some("300"));
    assert_eq!(attr(&canvas, root, "viewBox"), None);
    assert_eq!(canvas.host().tag_name(host(&canvas, root)), Some("svg"));
}

#[test]
fn viewbox_sizing() {
    let config = CanvasConfig {
        sizing: Some("viewbox".to_string()),
        ..CanvasConfig::new(400.0, 300.0)
    };
    let canvas = canvas(config);
    let root = canvas.root();
    assert_eq!(attr(&canvas, root, "viewBox").as_deref(), Some("0 0 400 300"));
    assert_eq!(
        attr(&canvas, root, "style").as_deref(),
        Some("max-width: 400px; max-height: 300px;")
    );
    assert_eq!(attr(&canvas, root, "width"), None);
}

#[test]
fn unknown_sizing_falls_back_to_fixed() {
    let config = CanvasConfig {
        sizing: Some("stretchy".to_string()),
        ..CanvasConfig::new(40.0, 30.0)
    };
    let canvas = canvas(config);
    assert_eq!(attr(&canvas, canvas.root(), "width").as_deref(), Some("40"));
}

#[test]
fn resize_reports_changes() {
    let mut canvas = canvas(CanvasConfig::new(400.0, 300.0));
    assert!(!canvas.resize(400.0, 300.0));
    assert!(canvas.resize(640.0, 480.0));
    assert_eq!(canvas.size(), (640.0, 480.0));
    assert_eq!(attr(&canvas, canvas.root(), "width").as_deref(), Some("640"));
    assert_eq!(attr(&canvas, canvas.root(), "height").as_deref(), Some("480"));
}

#[test]
fn render_is_idempotent() {
    let mut canvas = canvas(CanvasConfig::new(10.0, 10.0));
    let root = host(&canvas, canvas.root());
    let container = canvas.host().root();

    canvas.render(container);
    assert_eq!(canvas.host().children(container), vec![root]);

    let other = canvas.host_mut().create_element(canvas_traits::ns::SVG, "g");
    canvas.host_mut().append_child(container, other);
    canvas.render(other);
    assert_eq!(canvas.host().parent(root), Some(other));
    assert_eq!(canvas.host().children(container), vec![other]);
}

#[test]
fn update_merges_attributes() {
    let mut canvas = canvas(CanvasConfig::default());
    let id = canvas
        .add("rect", attrs! { "x" => 1, "y" => 2, "fill" => "red" }, Content::Empty)
        .unwrap()
        .unwrap();

    canvas.update(id, &attrs! { "fill" => "blue", "stroke" => "black" }).unwrap();

    let attributes = canvas.host().attributes(host(&canvas, id));
    let expected: Vec<(String, String)> = [
        ("x", "1"),
        ("y", "2"),
        ("fill", "blue"),
        ("stroke", "black"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect();
    assert_eq!(attributes, expected);
    assert_eq!(canvas.node(id).unwrap().attrs.get("fill"), Some("blue"));
}

#[test]
fn namespaced_attributes() {
    let mut canvas = canvas(CanvasConfig::default());
    let id = canvas
        .add("use", attrs! { "xlink:href" => "#shape" }, Content::Empty)
        .unwrap()
        .unwrap();
    let handle = host(&canvas, id);
    assert_eq!(
        canvas
            .host()
            .attribute(handle, Some(canvas_traits::ns::XLINK), "href")
            .as_deref(),
        Some("#shape")
    );
}

#[test]
fn nested_content_and_insertion() {
    let mut canvas = canvas(CanvasConfig::default());
    let content = vec![
        Descriptor::new("rect", attrs! { "width" => 4 }, Content::Empty),
        Descriptor::new("circle", attrs! { "r" => 2 }, Content::Empty),
    ];
    let group = canvas.add("g", attrs! { "class" => "group" }, content).unwrap().unwrap();

    let children = canvas.node(group).unwrap().children.clone();
    assert_eq!(children.len(), 2);
    let rect = children[0];
    assert_eq!(canvas.node(rect).unwrap().tag(), Some("rect"));

    let first = canvas
        .add_child(group, "line", attrs! { "x2" => 3 }, Content::Empty, Some(rect))
        .unwrap()
        .unwrap();
    assert_eq!(canvas.node(group).unwrap().children[0], first);
    assert_eq!(host_children(&canvas, group)[0], host(&canvas, first));
    assert_eq!(canvas.node(first).unwrap().insert_before, Some(rect));
}

#[test]
fn raw_descriptors_build_children() {
    let mut canvas = canvas(CanvasConfig::default());
    let raw: Vec<RawDescriptor> = serde_json::from_str(
        r#"[{"type": "g", "attributes": {"class": "legend"},
             "content": [{"type": "rect", "attributes": {"width": 10}}, "label"]}]"#,
    )
    .unwrap();

    let created = canvas.add_descriptors(canvas.root(), raw).unwrap();
    assert_eq!(created.len(), 1);
    let group = created[0];

    let markup = canvas.host().to_svg_string(host(&canvas, group));
    assert!(markup.starts_with("<g "), "{markup}");
    assert!(markup.ends_with(r#" class="legend"><rect width="10"/>label</g>"#), "{markup}");
    assert_eq!(canvas.node(group).unwrap().children.len(), 2);
}

#[test]
fn missing_type_fails_before_any_mutation() {
    let mut canvas = canvas(CanvasConfig::default());
    let before = (canvas.len(), canvas.host().len());
    let raw: Vec<RawDescriptor> = serde_json::from_str(
        r#"[{"type": "rect"}, {"type": "g", "content": [{"attributes": {"x": 1}}]}]"#,
    )
    .unwrap();

    let error = canvas.add_descriptors(canvas.root(), raw).unwrap_err();
    assert!(matches!(error, Error::MissingType { ref path } if path == &[1, 0]));
    assert_eq!((canvas.len(), canvas.host().len()), before);
}

#[test]
fn remove_leaves_no_references() {
    let mut canvas = canvas(CanvasConfig::default());
    let group = canvas.add("g", attrs! {}, Content::Empty).unwrap().unwrap();
    let child = canvas
        .add_child(group, "rect", attrs! { "width" => 1 }, Content::Empty, None)
        .unwrap()
        .unwrap();
    let (group_handle, child_handle) = (host(&canvas, group), host(&canvas, child));

    canvas.remove(group).unwrap();

    assert!(!canvas.contains(group));
    assert!(!canvas.contains(child));
    assert!(!canvas.node(canvas.root()).unwrap().children.contains(&group));
    assert!(!host_children(&canvas, canvas.root()).contains(&group_handle));
    assert!(!canvas.host().is_connected(group_handle));
    assert!(!canvas.host().is_connected(child_handle));
    assert!(matches!(canvas.remove(group), Err(Error::UnknownNode(id)) if id == group));
}

#[test]
fn root_cannot_be_removed() {
    let mut canvas = canvas(CanvasConfig::default());
    assert!(matches!(canvas.remove(canvas.root()), Err(Error::RootNode)));
}

#[test]
fn clear_keeps_the_node() {
    let mut canvas = canvas(CanvasConfig::default());
    let content = vec![Descriptor::new("rect", attrs! {}, Content::Empty)];
    let group = canvas.add("g", attrs! {}, content).unwrap().unwrap();

    canvas.clear(group).unwrap();
    assert!(canvas.contains(group));
    assert!(canvas.node(group).unwrap().children.is_empty());
    assert!(host_children(&canvas, group).is_empty());
}

#[test]
fn replace_keeps_identity_and_position() {
    let mut canvas = canvas(CanvasConfig::default());
    let a = rect(&mut canvas, 0);
    let b = rect(&mut canvas, 10);
    let c = rect(&mut canvas, 20);
    let d = canvas
        .add("circle", attrs! { "r" => 5 }, Content::Empty)
        .unwrap()
        .unwrap();
    let d_handle = host(&canvas, d);

    canvas.replace(b, d).unwrap();

    assert!(!canvas.contains(d));
    assert_eq!(canvas.node(b).unwrap().tag(), Some("circle"));
    assert_eq!(canvas.node(b).unwrap().id, b);
    assert_eq!(canvas.node(canvas.root()).unwrap().children, vec![a, b, c]);
    assert_eq!(
        host_children(&canvas, canvas.root()),
        vec![host(&canvas, a), d_handle, host(&canvas, c)]
    );
}

#[test]
fn invalidated_replace_skips_reordering() {
    let mut canvas = canvas(CanvasConfig::default());
    let a = rect(&mut canvas, 0);
    let b = rect(&mut canvas, 10);
    let c = rect(&mut canvas, 20);
    let d = canvas.add("circle", attrs! {}, Content::Empty).unwrap().unwrap();

    canvas.invalidate(b).unwrap();
    canvas.replace(b, d).unwrap();

    assert_eq!(canvas.node(canvas.root()).unwrap().children, vec![a, c, b]);
    assert_eq!(
        host_children(&canvas, canvas.root()),
        vec![host(&canvas, a), host(&canvas, c), host(&canvas, b)]
    );
}

#[test]
fn replace_rejects_ancestors_and_descendants() {
    let mut canvas = canvas(CanvasConfig::default());
    let group = canvas.add("g", attrs! {}, Content::Empty).unwrap().unwrap();
    let child = canvas
        .add_child(group, "rect", attrs! { "width" => 1 }, Content::Empty, None)
        .unwrap()
        .unwrap();
    let before = host_children(&canvas, canvas.root());

    assert!(matches!(
        canvas.replace(child, group),
        Err(Error::ReplaceWithAncestor(id)) if id == group
    ));
    assert!(matches!(
        canvas.replace(group, child),
        Err(Error::ReplaceWithDescendant(id)) if id == child
    ));

    assert_eq!(canvas.node(canvas.root()).unwrap().children, vec![group]);
    assert_eq!(host_children(&canvas, canvas.root()), before);
    assert_eq!(canvas.node(child).unwrap().parent, Some(group));
    assert_eq!(host_children(&canvas, group), vec![host(&canvas, child)]);
}

#[test]
fn elements_by_attributes() {
    let mut canvas = canvas(CanvasConfig::default());
    let first = canvas
        .add("rect", attrs! { "class" => "bar", "data-series" => 1 }, Content::Empty)
        .unwrap()
        .unwrap();
    let second = canvas
        .add("rect", attrs! { "class" => "bar", "data-series" => 2 }, Content::Empty)
        .unwrap()
        .unwrap();

    assert_eq!(canvas.get_elements_by_attributes(&[("class", "bar")]), vec![first, second]);
    assert_eq!(
        canvas.get_elements_by_attributes(&[("class", "bar"), ("data-series", "2")]),
        vec![second]
    );
    assert!(canvas.get_elements_by_attributes(&[("class", "line")]).is_empty());
}

#[test]
fn unique_ids() {
    let mut canvas = canvas(CanvasConfig::default());
    let first = canvas.next_id("clip");
    let second = canvas.next_id("clip");
    assert_ne!(first, second);
    assert!(first.starts_with("clip-"));
}
