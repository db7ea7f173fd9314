/*!
Device-protocol core for Novation Launchpad grid controllers.

`padlight` translates between logical operations - light a pad, show an
image, ask for the firmware version - and the MIDI bytes the hardware
actually speaks (Note On/Off, Control Change, and vendor SysEx), and
routes decoded input through registered callbacks instead of polling.

The differences between hardware generations (pad numbering, palette vs.
RGB SysEx, vendor headers) are described as data in a fixed
[model registry](crate::model); one codec parameterized by a
[`DeviceModel`] covers them all.

# Talking to a device

```no_run
use std::time::Duration;
use padlight::{Color, EventKind, MidiSession, Pad};

let session = MidiSession::connect("Launchpad Mini MK3 LPMiniMK3 MIDI", "mini-mk3")?;

session.on(EventKind::Press, Box::new(|event| {
    println!("pressed {:?}", event.pad());
}))?;

session.set_pad(Pad::new(3, 5), Color::rgb(255, 0, 0))?;
let version = session.request_firmware(Duration::from_secs(1))?;
println!("firmware {version}");

session.disconnect();
# Ok::<(), padlight::Error>(())
```

Inbound bytes arrive on the MIDI backend's own thread and callbacks run
there synchronously, so keep them short; anything long-running belongs on
another thread, fed from the callback.

# Without hardware

[`Session`] is generic over [`Transport`], so everything above the raw
port layer can be driven by a fake transport in tests; [`codec`] is pure
and needs no transport at all.
*/

pub mod codec;
pub mod model;

mod color;
pub use color::{quantize_channel, Color};

mod pad;
pub use pad::{Grid, Pad};

mod event;
pub use event::{EventDetail, EventKind, InputEvent};

mod error;
pub use error::{Error, Result};

mod dispatch;
pub use dispatch::{Callback, Dispatcher, ErrorSink, Subscription};

mod midi_io;
pub use midi_io::{MidirTransport, ReceiveCallback, Transport};

mod session;
pub use session::{MidiSession, Session};

pub use model::{AddressScheme, ColorScheme, DeviceModel};
