//! Counter demo
//!
//! Drives a small tree for a number of frames, logging whenever it changes.
//! Run with `RUST_LOG=debug` to see the nodes being built and freed.

// Imports
use {
	anyhow::Context as _,
	arbor_reactive::{Signal, SignalGet, SignalUpdate, SignalWith},
	arbor_tree::{Component, Node, Tree},
	core::time::Duration,
};

/// Frame update
struct Update {
	/// Time since the last frame
	dt: Duration,
}

/// Counter
#[derive(Clone, Debug)]
struct Counter {
	/// Frames elapsed
	frames: Signal<usize>,

	/// Time elapsed
	elapsed: Signal<Duration>,
}

fn main() -> Result<(), anyhow::Error> {
	arbor_logger::init();

	let frames = std::env::args()
		.nth(1)
		.map(|arg| arg.parse::<usize>())
		.transpose()
		.context("Unable to parse number of frames")?
		.unwrap_or(10);

	let tree = Tree::new();
	let counter = Counter {
		frames:  Signal::new(tree.world(), 0),
		elapsed: Signal::new(tree.world(), Duration::ZERO),
	};
	tree.set_singleton(counter.clone());
	tree.attach_to_root(&self::app(counter));

	let dt = Duration::from_millis(16);
	for _ in 0..frames {
		tree.call(&Update { dt });
		tree.update();
	}

	tree.shutdown();

	Ok(())
}

/// App
fn app(counter: Counter) -> Component {
	Component::named("app", move |node: &Node| {
		node.create_context(counter.clone());
		node.after::<Update, _>(|node, _| tracing::trace!(children=node.children().len(), "Finished frame"));

		let world = node.tree().world().clone();
		let blink = world.memo({
			let frames = counter.frames.clone();
			move || (frames.get() / 3) % 2 == 1
		});
		let recent = world.memo({
			let frames = counter.frames.clone();
			move || {
				let frames = frames.get();
				(frames.saturating_sub(3)..frames).collect::<Vec<_>>()
			}
		});

		[
			self::ticker(),
			self::label(),
			Component::conditional(blink, self::blink()),
			Component::keyed_list(recent, |&frame: &usize| frame, |&frame: &usize| {
				Component::named(format!("frame-{frame}"), move |_: &Node| {
					tracing::debug!(frame, "Built frame node");
				})
			}),
		]
	})
}

/// Advances the counter every frame
fn ticker() -> Component {
	Component::named("ticker", |node: &Node| {
		let counter = node.use_context::<Counter>();
		node.on::<Update, _>(move |node, update| {
			node.tree().world().batch(|| {
				counter.with_raw(|counter| {
					counter.frames.update(|frames| *frames += 1);
					counter.elapsed.update(|elapsed| *elapsed += update.dt);
				});
			});
		});
	})
}

/// Logs the counter whenever it changes
fn label() -> Component {
	Component::named("label", |node: &Node| {
		let counter = node.use_singleton::<Counter>();
		node.effect(move || {
			tracing::info!(frames=counter.frames.get(), elapsed=?counter.elapsed.get(), "Counter changed");
		});
	})
}

/// Exists only every other 3 frames
fn blink() -> Component {
	Component::named("blink", |node: &Node| {
		node.use_effect((), || {
			tracing::info!("Blink on");
			|| tracing::info!("Blink off")
		});
	})
}
