// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds and draw sequences of the concrete layers.

use std::cell::Cell;
use std::sync::Arc;

use kurbo::{Affine, Rect, RoundedRect, Size, Vec2};
use peniko::Color;
use understory_compositor::{
    BackdropFilterLayer, ClipPathLayer, ClipRRectLayer, ClipRectLayer, CompositorContext,
    ContainerLayer, ExternalTexture, Layer, LayerTree, OpacityLayer, PictureLayer, TextureLayer,
    TransformLayer,
};
use understory_picture::geometry::is_empty_rect;
use understory_picture::{
    CanvasExt, DrawCommand, Image, ImageFilter, Paint, Path, Picture, RecordingCanvas,
};

fn square(rect: Rect) -> Picture {
    let mut canvas = RecordingCanvas::default();
    canvas.draw_rect(rect, &Paint::fill(Color::from_rgb8(0x80, 0x80, 0x80)));
    canvas.end_recording().unwrap()
}

fn run_frame(tree: &mut LayerTree) -> Picture {
    let mut context = CompositorContext::default();
    let mut canvas = RecordingCanvas::default();
    {
        let mut frame = context.acquire_frame(&mut canvas);
        tree.preroll(&mut frame, false);
        tree.paint(&mut frame, false);
    }
    canvas.end_recording().unwrap()
}

fn tree_of(root: impl Layer + 'static) -> LayerTree {
    LayerTree::new(Box::new(root), Size::new(200.0, 200.0), 1.0)
}

#[test]
fn clip_rect_intersects_child_bounds() {
    let clip = ClipRectLayer::new(Rect::new(0.0, 0.0, 50.0, 50.0)).with_child(Box::new(
        PictureLayer::new(square(Rect::new(40.0, 40.0, 100.0, 100.0)), Vec2::ZERO),
    ));
    let mut tree = tree_of(clip);
    let picture = run_frame(&mut tree);

    assert_eq!(tree.root().paint_bounds(), Rect::new(40.0, 40.0, 50.0, 50.0));
    assert_eq!(picture.commands()[0], DrawCommand::Save);
    assert_eq!(
        picture.commands()[1],
        DrawCommand::ClipRect(Rect::new(0.0, 0.0, 50.0, 50.0))
    );
    assert_eq!(picture.commands().last(), Some(&DrawCommand::Restore));
}

#[test]
fn clip_culls_children_outside_it() {
    let child = PictureLayer::new(square(Rect::new(60.0, 60.0, 80.0, 80.0)), Vec2::ZERO);
    let child_id = child.base().id();
    let clip = ClipRRectLayer::new(RoundedRect::new(0.0, 0.0, 50.0, 50.0, 8.0))
        .with_child(Box::new(child));
    let mut tree = tree_of(clip);
    let picture = run_frame(&mut tree);

    let child = tree.find(child_id).unwrap();
    assert!(is_empty_rect(child.paint_bounds()));
    assert!(!tree.root().needs_painting());
    assert!(picture.commands().is_empty());
}

#[test]
fn clip_path_culls_by_its_bounding_box() {
    // The triangle leaves the child's corner outside the shape but inside its
    // bounding box, so the child is still prerolled and painted.
    let mut triangle = Path::new();
    triangle.elements_mut().move_to((0.0, 0.0));
    triangle.elements_mut().line_to((100.0, 0.0));
    triangle.elements_mut().line_to((0.0, 100.0));
    triangle.elements_mut().close_path();

    let clip = ClipPathLayer::new(triangle).with_child(Box::new(PictureLayer::new(
        square(Rect::new(80.0, 80.0, 90.0, 90.0)),
        Vec2::ZERO,
    )));
    let mut tree = tree_of(clip);
    let picture = run_frame(&mut tree);

    assert_eq!(tree.root().paint_bounds(), Rect::new(80.0, 80.0, 90.0, 90.0));
    assert!(matches!(picture.commands()[1], DrawCommand::ClipPath(_)));
}

#[test]
fn transform_maps_child_bounds() {
    let layer = TransformLayer::new(Affine::translate((10.0, 20.0)) * Affine::scale(2.0))
        .with_child(Box::new(PictureLayer::new(
            square(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Vec2::ZERO,
        )));
    let mut tree = tree_of(layer);
    let picture = run_frame(&mut tree);

    assert_eq!(tree.root().paint_bounds(), Rect::new(10.0, 20.0, 30.0, 40.0));
    assert_eq!(picture.paint_bounds(), Rect::new(10.0, 20.0, 30.0, 40.0));
}

#[test]
fn transform_maps_the_cull_rect_into_child_space() {
    let child = PictureLayer::new(square(Rect::new(0.0, 0.0, 10.0, 10.0)), Vec2::ZERO);
    let child_id = child.base().id();
    let shifted = TransformLayer::new(Affine::translate((200.0, 0.0))).with_child(Box::new(child));
    let clip = ClipRectLayer::new(Rect::new(0.0, 0.0, 100.0, 100.0)).with_child(Box::new(shifted));
    let mut tree = tree_of(clip);
    run_frame(&mut tree);

    assert!(is_empty_rect(tree.find(child_id).unwrap().paint_bounds()));
    assert!(!tree.root().needs_painting());
}

#[test]
fn singular_transform_culls_nothing() {
    let child = PictureLayer::new(square(Rect::new(0.0, 0.0, 10.0, 10.0)), Vec2::ZERO);
    let child_id = child.base().id();
    let flat = TransformLayer::new(Affine::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
        .with_child(Box::new(child));
    let mut tree = tree_of(flat);
    run_frame(&mut tree);

    assert_eq!(
        tree.find(child_id).unwrap().paint_bounds(),
        Rect::new(0.0, 0.0, 10.0, 10.0)
    );
}

#[test]
fn opacity_groups_children_in_a_layer() {
    let layer = OpacityLayer::new(128, Vec2::new(10.0, 10.0)).with_child(Box::new(
        PictureLayer::new(square(Rect::new(0.0, 0.0, 20.0, 20.0)), Vec2::ZERO),
    ));
    let mut tree = tree_of(layer);
    let picture = run_frame(&mut tree);

    assert_eq!(tree.root().paint_bounds(), Rect::new(10.0, 10.0, 30.0, 30.0));
    let commands = picture.commands();
    assert_eq!(commands[0], DrawCommand::Save);
    assert_eq!(commands[1], DrawCommand::Translate { dx: 10.0, dy: 10.0 });
    assert_eq!(
        commands[2],
        DrawCommand::SetMatrix(Affine::translate((10.0, 10.0)))
    );
    assert_eq!(
        commands[3],
        DrawCommand::SaveLayer {
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
            paint: Paint::fill(Color::from_rgba8(255, 255, 255, 128)),
        }
    );
    assert_eq!(picture.paint_bounds(), Rect::new(10.0, 10.0, 30.0, 30.0));
}

#[test]
fn backdrop_filter_keeps_child_bounds() {
    let filter = ImageFilter::Blur {
        sigma_x: 4.0,
        sigma_y: 4.0,
    };
    let layer = BackdropFilterLayer::new(filter).with_child(Box::new(PictureLayer::new(
        square(Rect::new(0.0, 0.0, 20.0, 20.0)),
        Vec2::ZERO,
    )));
    let mut tree = tree_of(layer);
    let picture = run_frame(&mut tree);

    assert_eq!(tree.root().paint_bounds(), Rect::new(0.0, 0.0, 20.0, 20.0));
    assert!(matches!(
        &picture.commands()[0],
        DrawCommand::SaveLayer { paint, .. } if paint.backdrop == Some(filter)
    ));
}

#[derive(Debug, Default)]
struct Producer {
    frame: Cell<Option<Image>>,
}

impl ExternalTexture for Producer {
    fn latest_image(&self) -> Option<Image> {
        self.frame.get()
    }
}

#[test]
fn texture_without_a_frame_draws_nothing() {
    let producer = Arc::new(Producer::default());
    let layer = TextureLayer::new(producer.clone(), Vec2::new(5.0, 5.0), Size::new(40.0, 30.0));
    let mut tree = tree_of(ContainerLayer::new().with_child(Box::new(layer)));

    let picture = run_frame(&mut tree);
    assert_eq!(tree.root().paint_bounds(), Rect::new(5.0, 5.0, 45.0, 35.0));
    assert!(picture.commands().is_empty());

    let image = Image::new(40, 30);
    producer.frame.set(Some(image));
    let picture = run_frame(&mut tree);
    assert_eq!(
        picture.commands(),
        &[DrawCommand::DrawImageRect {
            image,
            src: None,
            dst: Rect::new(5.0, 5.0, 45.0, 35.0),
            paint: Paint::default(),
        }]
    );
}

#[test]
fn sibling_after_a_culled_clip_keeps_the_full_cull_rect() {
    let hidden = PictureLayer::new(square(Rect::new(50.0, 50.0, 60.0, 60.0)), Vec2::ZERO);
    let hidden_id = hidden.base().id();
    let visible = PictureLayer::new(square(Rect::new(50.0, 50.0, 60.0, 60.0)), Vec2::ZERO);
    let visible_id = visible.base().id();
    let root = ContainerLayer::new()
        .with_child(Box::new(
            ClipRectLayer::new(Rect::new(0.0, 0.0, 10.0, 10.0)).with_child(Box::new(hidden)),
        ))
        .with_child(Box::new(visible));
    let mut tree = tree_of(root);
    let picture = run_frame(&mut tree);

    assert!(is_empty_rect(tree.find(hidden_id).unwrap().paint_bounds()));
    assert_eq!(
        tree.find(visible_id).unwrap().paint_bounds(),
        Rect::new(50.0, 50.0, 60.0, 60.0)
    );
    assert_eq!(tree.root().paint_bounds(), Rect::new(50.0, 50.0, 60.0, 60.0));
    assert_eq!(picture.paint_bounds(), Rect::new(50.0, 50.0, 60.0, 60.0));
}
