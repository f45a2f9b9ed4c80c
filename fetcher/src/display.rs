use helpers::history::History;
use log::{debug, error, info};

use crate::scene::{BoxGeometry, Color, NodeId, Primitive, Scene, SceneNode};

pub const LEFT_BOX: [f32; 3] = [-1.0, 0.5, 0.1];
pub const RIGHT_BOX: [f32; 3] = [1.0, 0.5, 0.1];
const BOX_SIDE: f32 = 0.5;
const PLANE: BoxGeometry = BoxGeometry {
    width: 2.0,
    height: 1.0,
    depth: 0.05,
};

/// Pointer listener of a card. The first press removes it and paints the
/// card red.
#[derive(Debug)]
struct ClickBehavior {
    scene: Scene,
    card: NodeId,
}

impl ClickBehavior {
    fn install(scene: &Scene, card: NodeId) -> Self {
        scene.borrow_mut().listen_pointer(card);
        Self {
            scene: Scene::clone(scene),
            card,
        }
    }
}

impl Drop for ClickBehavior {
    fn drop(&mut self) {
        match self.scene.try_borrow_mut() {
            Ok(mut scene) => {
                scene.unlisten_pointer(self.card);
            }
            Err(_) => error!(
                "[CLICK] listener on {:?} leaked: scene is busy",
                self.card
            ),
        }
        debug!("[CLICK] tear down on {:?}", self.card);
    }
}

#[derive(Debug)]
struct BoxCard {
    click: Option<ClickBehavior>,
    mesh: Option<SceneNode>,
    card: SceneNode,
    translation: [f32; 3],
    color: Color,
}

impl BoxCard {
    fn new(scene: &Scene, parent: NodeId, translation: [f32; 3], color: Color) -> Self {
        let card = SceneNode::attach(scene, Some(parent), Primitive::Group { translation });
        let click = ClickBehavior::install(scene, card.id());
        let mut result = Self {
            click: Some(click),
            mesh: None,
            card,
            translation,
            color,
        };
        result.set_color(color);
        result
    }

    fn set_color(&mut self, color: Color) {
        // The old mesh goes before the new one is built.
        self.mesh = None;
        self.mesh = Some(SceneNode::attach(
            self.card.scene(),
            Some(self.card.id()),
            Primitive::Mesh {
                geometry: BoxGeometry::cube(BOX_SIDE),
                color,
            },
        ));
        self.color = color;
    }

    fn pointer_down(&mut self) -> bool {
        if self.click.take().is_none() {
            return false;
        }
        self.set_color(Color::RED);
        true
    }

    fn view(&self) -> BoxView {
        BoxView {
            card: self.card.id(),
            translation: self.translation,
            color: self.color,
            clickable: self.click.is_some(),
        }
    }
}

/// What a participant currently shows for one box.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct BoxView {
    pub card: NodeId,
    pub translation: [f32; 3],
    pub color: Color,
    pub clickable: bool,
}

/// Renders the latest broadcast price.
///
/// Each `apply` releases the boxes of the previous price before building the
/// new ones, so the scene only ever reflects the latest broadcast.
#[derive(Debug)]
pub struct PriceBoard {
    boxes: Vec<BoxCard>,
    plane: Option<SceneNode>,
    root: SceneNode,
    latest: Option<History>,
}

impl PriceBoard {
    pub fn new(scene: &Scene) -> Self {
        let root = SceneNode::attach(
            scene,
            None,
            Primitive::Group {
                translation: [0.0; 3],
            },
        );
        let mut board = Self {
            boxes: Vec::new(),
            plane: None,
            root,
            latest: None,
        };
        board.setup_plane();
        board
    }

    fn setup_plane(&mut self) {
        self.plane = None;
        self.plane = Some(SceneNode::attach(
            self.root.scene(),
            Some(self.root.id()),
            Primitive::Mesh {
                geometry: PLANE,
                color: Color::GREY,
            },
        ));
    }

    pub fn apply(&mut self, history: History) {
        self.boxes.clear();

        let even = history.is_even();
        info!("[BOARD] price {} (even: {})", history.price, even);

        let scene = Scene::clone(self.root.scene());
        let root = self.root.id();
        self.boxes
            .push(BoxCard::new(&scene, root, LEFT_BOX, Color::GREEN));
        if even {
            self.boxes
                .push(BoxCard::new(&scene, root, RIGHT_BOX, Color::BLUE));
        }
        self.latest = Some(history);
    }

    /// Routes a pointer press to the card it hit. Returns true if a click
    /// behavior handled it.
    pub fn pointer_down(&mut self, card: NodeId) -> bool {
        self.boxes
            .iter_mut()
            .find(|entry| entry.card.id() == card)
            .map(BoxCard::pointer_down)
            .unwrap_or(false)
    }

    pub fn boxes(&self) -> Vec<BoxView> {
        self.boxes.iter().map(BoxCard::view).collect()
    }

    pub fn latest(&self) -> Option<History> {
        self.latest
    }

    pub fn root(&self) -> NodeId {
        self.root.id()
    }

    /// Releases every box and the backdrop plane.
    pub fn teardown(&mut self) {
        self.boxes.clear();
        self.plane = None;
    }
}
