use materia_scene::{MaterialProperty, SharedMaterial, SliderConfig};

/// Snap `value` to the slider's step grid (anchored at `min`) and clamp it
/// to `[min, max]`.
pub fn quantize(value: f32, slider: &SliderConfig) -> f32 {
    let min = slider.min as f64;
    let max = slider.max as f64;
    let step = slider.step as f64;
    let steps = ((value as f64 - min) / step).round();
    (min + steps * step).clamp(min, max) as f32
}

/// Live-editable sliders bound to properties of the shared material.
#[derive(Debug, Clone)]
pub struct ParameterPanel {
    title: String,
    sliders: Vec<SliderConfig>,
}

impl ParameterPanel {
    pub fn new(sliders: Vec<SliderConfig>) -> Self {
        Self {
            title: "Material".to_string(),
            sliders,
        }
    }

    pub fn sliders(&self) -> &[SliderConfig] {
        &self.sliders
    }

    pub fn slider(&self, property: MaterialProperty) -> Option<&SliderConfig> {
        self.sliders.iter().find(|s| s.property == property)
    }

    /// Write `value` into the material the way a slider drag would.
    ///
    /// Returns the value actually stored, or `None` when the property has no
    /// slider or `value` is NaN.
    pub fn set(&self, material: &SharedMaterial, property: MaterialProperty, value: f32) -> Option<f32> {
        let slider = self.slider(property)?;
        if value.is_nan() {
            return None;
        }
        let applied = quantize(value, slider);
        property.set(&mut material.borrow_mut(), applied);
        tracing::debug!(property = property.label(), value = applied, "material parameter set");
        Some(applied)
    }

    /// Draw the panel. Returns whether any slider changed the material.
    pub fn show(&self, ctx: &egui::Context, material: &SharedMaterial) -> bool {
        let mut changed = false;
        egui::Window::new(self.title.as_str())
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                for slider in &self.sliders {
                    let mut value = slider.property.get(&material.borrow());
                    let response = ui.add(
                        egui::Slider::new(&mut value, slider.min..=slider.max)
                            .step_by(slider.step as f64)
                            .text(slider.property.label()),
                    );
                    if response.changed() && self.set(material, slider.property, value).is_some() {
                        changed = true;
                    }
                }
            });
        changed
    }
}
